//! Canned answers for high-frequency trivial questions.
//!
//! The table is scanned top to bottom and the first matching pattern wins.
//! Patterns are matched case-insensitively against the trimmed question.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which entry point is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Questions about an ingested repository: only small talk is answered
    /// from the table, everything else goes to retrieval.
    Conversation,
    /// The general assistant: every rule applies.
    Assistant,
}

#[derive(Debug)]
struct Rule {
    intent: &'static str,
    scope: Scope,
    patterns: &'static [&'static str],
    answer: &'static str,
}

/// A rule hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub intent: &'static str,
    pub answer: &'static str,
}

pub const EMPTY_ANSWER: &str =
    "Looks like an empty message! Type a question and I'll do my best to help.";

const IDENTITY_ANSWER: &str = "I'm a code assistant. I read the repositories you ingest, \
     split them into searchable pieces, and answer questions about them by pointing at the \
     files that matter.";

static RULES: &[Rule] = &[
    Rule {
        intent: "easter_egg",
        scope: Scope::Conversation,
        patterns: &[r"^xyzzy[\s!?.]*$", r"^plugh[\s!?.]*$"],
        answer: "Nothing happens. Then again, every codebase has a hidden passage somewhere. \
                 Ask me where to look.",
    },
    Rule {
        intent: "greeting",
        scope: Scope::Conversation,
        patterns: &[
            r"^(hi|hello|hey|howdy|yo|hiya|sup|what'?s up)[\s!?.]*$",
            r"^good (morning|afternoon|evening)",
            r"^(greetings|salutations)",
        ],
        answer: "Hey! I can walk you through a codebase, explain how things fit together, \
                 or help you get a repository ingested. What do you need?",
    },
    Rule {
        intent: "identity",
        scope: Scope::Conversation,
        patterns: &[
            r"who are you",
            r"what are you",
            r"are you (an? )?(ai|bot|assistant|robot)",
            r"tell me about yourself",
        ],
        answer: IDENTITY_ANSWER,
    },
    Rule {
        intent: "upload_howto",
        scope: Scope::Assistant,
        patterns: &[
            r"how (do i|to|can i) upload",
            r"upload.*(repo|repository|code|project)",
            r"how.*(add|submit|import).*(repo|code|project)",
            r"where.*(upload|import)",
        ],
        answer: "To ingest a repository:\n\n\
                 1. `POST /api/upload` with `{\"github_url\": \"https://github.com/owner/repo\"}` \
                 for a public GitHub repository\n\
                 2. or `POST /api/upload/zip?name=project.zip` with the archive as the request body\n\
                 3. or `POST /api/upload` with `{\"text\": \"...\"}` to paste a single snippet\n\n\
                 The response carries a `repo_id` and a summary. Use the id to ask questions.",
    },
    Rule {
        intent: "chat_howto",
        scope: Scope::Assistant,
        patterns: &[
            r"how (does|do) (the )?(repo )?chat work",
            r"how (to|do i) (use )?(the )?(repo )?chat",
            r"how (to|can i) ask.*(question|about|code)",
            r"what can i ask",
            r"how (does )?code chat",
        ],
        answer: "Send `POST /api/chat` with `{\"repo_id\": \"...\", \"question\": \"...\"}`. \
                 I score every piece of the repository against your question, keep the most \
                 relevant ones and answer from them.\n\n\
                 Try things like:\n\
                 - *\"What does the main entry point do?\"*\n\
                 - *\"How is authentication handled?\"*\n\
                 - *\"Explain the function process_data\"*",
    },
    Rule {
        intent: "assistant_howto",
        scope: Scope::Assistant,
        patterns: &[
            r"how (does|do) (the )?assistant work",
            r"how (does|do) you work",
            r"what('s| is) (the )?assistant",
            r"how (do i|to) use (the )?assistant",
        ],
        answer: "I'm the general assistant at `POST /api/assistant-chat`. Common questions get \
                 an instant answer from my built-in knowledge; anything more open-ended is \
                 passed to a language model. I don't need a repository to work.",
    },
    Rule {
        intent: "who_built",
        scope: Scope::Assistant,
        patterns: &[
            r"who (built|made|created|developed|wrote) (this|you)",
            r"who('s| is) the (creator|developer|author|maker)",
            r"who (is )?behind (this|you)",
        ],
        answer: "I was built as a code analysis service: a Rust backend that ingests \
                 repositories, indexes their text and answers questions about it.",
    },
    Rule {
        intent: "help",
        scope: Scope::Assistant,
        patterns: &[
            r"^help[\s!?.]*$",
            r"what can you (do|help with)",
            r"how (can you|do you) help",
            r"what (are your|do you have) (features|capabilities)",
        ],
        answer: "I can help with:\n\n\
                 - **Ingestion**: getting a repository in by URL, archive or pasted text\n\
                 - **Code questions**: answers grounded in the files of an ingested repository\n\
                 - **Troubleshooting**: common failures and what to do about them\n\
                 - **General questions**: anything else, I'll do my best\n\n\
                 Just ask away!",
    },
    Rule {
        intent: "features",
        scope: Scope::Assistant,
        patterns: &[
            r"what (features|functionality)",
            r"list.*(features|capabilities)",
            r"what (does|can) (this app|this service|it) do",
        ],
        answer: "Here's what I can do:\n\n\
                 - **Repository ingestion** from a GitHub URL, a ZIP archive or pasted text\n\
                 - **Parsing and chunking** of every text source file\n\
                 - **Summaries** per file plus a project overview and architecture notes\n\
                 - **Code chat** grounded in the most relevant pieces of a repository\n\
                 - **Model fallback** so an answer always comes back, even when a model is down",
    },
    Rule {
        intent: "thanks",
        scope: Scope::Conversation,
        patterns: &[
            r"^(thanks|thank you|thx|ty|cheers)[\s!?.]*$",
            r"^(much appreciated|appreciate it)",
        ],
        answer: "You're welcome! Let me know if you need anything else.",
    },
    Rule {
        intent: "navigation",
        scope: Scope::Assistant,
        patterns: &[
            r"how (do i|to) navigate",
            r"where (do i|can i) find",
            r"what (endpoints|routes)",
            r"list (the )?(endpoints|routes)",
        ],
        answer: "Available endpoints:\n\n\
                 - `GET /api/health`: liveness check\n\
                 - `POST /api/upload`: ingest a GitHub URL or pasted text\n\
                 - `POST /api/upload/zip`: ingest a ZIP archive\n\
                 - `GET /api/repos/{id}/summary`: summary of an ingested repository\n\
                 - `POST /api/chat`: ask about an ingested repository\n\
                 - `POST /api/assistant-chat`: talk to me",
    },
    Rule {
        intent: "upload_trouble",
        scope: Scope::Assistant,
        patterns: &[
            r"upload.*(fail|error|not working|broken|stuck)",
            r"(can'?t|cannot|unable to) upload",
        ],
        answer: "If ingestion is failing:\n\n\
                 1. **GitHub URLs**: the repository must be public and the URL must look like \
                 `https://github.com/owner/repo`\n\
                 2. **ZIP files**: the name must end in `.zip` and the archive must stay under the \
                 upload limit\n\
                 3. **Network**: cloning needs outbound access to GitHub\n\
                 4. **Retry**: transient clone failures usually clear up on a second try",
    },
    Rule {
        intent: "chat_trouble",
        scope: Scope::Assistant,
        patterns: &[
            r"chat.*(not working|broken|error|fail|empty|no response)",
            r"(can'?t|cannot) (get|receive) (an? )?answer",
            r"ai.*(not responding|down|broken|error)",
        ],
        answer: "If chat isn't answering:\n\n\
                 1. Make sure the repository was ingested and you're sending its `repo_id`\n\
                 2. Ingested repositories expire after an hour; a 404 means it's time to re-upload\n\
                 3. Under heavy load I fall back through several models, so wait a moment and retry",
    },
    Rule {
        intent: "troubleshooting",
        scope: Scope::Assistant,
        patterns: &[
            r"^(something'?s? )?(not working|broken|error|bug)",
            r"i('m| am) (having|getting) (an? )?(error|issue|problem)",
            r"troubleshoot",
        ],
        answer: "General troubleshooting:\n\n\
                 1. **Check the response body**: errors come back with a plain explanation\n\
                 2. **Check connectivity**: ingestion and answers both need the network\n\
                 3. **Re-upload**: repository data expires after a while\n\n\
                 Tell me what you're seeing and I can help further!",
    },
    Rule {
        intent: "farewell",
        scope: Scope::Conversation,
        patterns: &[r"^(bye|goodbye|see you|later|cya|gtg)[\s!?.]*$"],
        answer: "See you later! I'll be right here if you need me.",
    },
];

struct CompiledRule {
    rule: &'static Rule,
    patterns: Vec<Regex>,
}

static COMPILED: Lazy<Vec<CompiledRule>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| CompiledRule {
            rule,
            patterns: rule
                .patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).expect("rule pattern is a valid regex"))
                .collect(),
        })
        .collect()
});

/// First rule matching the trimmed question, if any. Empty input always
/// matches.
pub fn match_rule(question: &str, scope: Scope) -> Option<RuleMatch> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Some(RuleMatch {
            intent: "empty",
            answer: EMPTY_ANSWER,
        });
    }

    COMPILED
        .iter()
        .filter(|c| scope == Scope::Assistant || c.rule.scope == Scope::Conversation)
        .find(|c| c.patterns.iter().any(|re| re.is_match(trimmed)))
        .map(|c| {
            tracing::debug!("Rule {} matched {trimmed:?}", c.rule.intent);
            RuleMatch {
                intent: c.rule.intent,
                answer: c.rule.answer,
            }
        })
}
