use anyhow::Result;

use super::App;

/// Run a free-form request, with the user's session context when `user_id` is set.
pub async fn ask(app: &App, prompt: &str, user_id: i64) -> Result<()> {
    let workflow = app.workflow()?;

    let pb = super::spinner("Thinking...");
    let report = workflow.execute_prompt(prompt, user_id).await;
    pb.finish_and_clear();

    println!("{}", report.to_message());
    Ok(())
}
