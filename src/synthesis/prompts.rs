//! Prompt construction for each synthesis entry point.

use chrono::NaiveDate;

/// Largest message the chat presentation layer accepts.
pub const MESSAGE_LIMIT: usize = 4096;

/// Start/end markers around the session context block.
pub const CONTEXT_START: &str = "=== TODAY'S ENTRIES ===";
pub const CONTEXT_END: &str = "=== END OF ENTRIES ===";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn format_rules(language: &str, opening: &str) -> String {
    format!(
        "RESPONSE FORMAT:\n\
         - Use ONLY these HTML tags: <b>, <i>, <code>\n\
         - Do NOT use markdown (**, ##, ```)\n\
         - Start with: {opening}\n\
         - Be concise: the message limit is {MESSAGE_LIMIT} characters\n\
         - Write in {language}"
    )
}

pub fn daily(day: NaiveDate, entries: &str, language: &str) -> Prompt {
    let system = format!(
        "You are d-brain, a personal assistant. Your task is to process the user's entries for one day.\n\
         \n\
         RULES:\n\
         1. Analyze every entry for the day\n\
         2. Extract the key thoughts and ideas\n\
         3. Find tasks, explicit and implicit\n\
         4. Describe the emotional tone\n\
         5. Suggest next actions\n\
         \n\
         {}",
        format_rules(language, "📊 <b>Processing for DATE</b>")
    );
    let user = format!("Today is {day}. Process the entries for the day:\n\n{entries}");
    Prompt { system, user }
}

pub fn weekly(today: NaiveDate, week_content: &str, language: &str) -> Prompt {
    let system = format!(
        "You are d-brain, a personal assistant. Write a weekly digest.\n\
         \n\
         RULES:\n\
         1. Analyze the entries for the week\n\
         2. Identify the main themes and trends\n\
         3. Note wins and achievements\n\
         4. Identify challenges and problems\n\
         5. Propose a focus for next week\n\
         \n\
         {}",
        format_rules(language, "📅 <b>Weekly digest</b>")
    );
    let user = format!("Today is {today}. Here are the entries for the week:\n\n{week_content}");
    Prompt { system, user }
}

/// Free-form request. `session_context` may be empty.
pub fn free_form(
    today: NaiveDate,
    vault: &str,
    session_context: &str,
    request: &str,
    language: &str,
) -> Prompt {
    let system = format!(
        "{session_context}\
         You are d-brain, a personal assistant.\n\
         \n\
         CONTEXT:\n\
         - Date: {today}\n\
         - Vault: {vault}\n\
         \n\
         RULES:\n\
         - Answer briefly and to the point\n\
         {}",
        format_rules(language, "an emoji and a <b>heading</b>")
    );
    Prompt {
        system,
        user: request.to_string(),
    }
}
