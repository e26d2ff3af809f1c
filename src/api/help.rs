//! Command help, as shown by the bot's plugin help page.

use serde::Serialize;

use super::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
    pub who_can_use: &'static str,
    pub examples: Vec<&'static str>,
}

/// GET /help - Describe the `/sync-teams` command.
pub async fn command_help() -> ApiResponse<Vec<CommandHelp>> {
    ApiResponse::new(vec![CommandHelp {
        usage: "/sync-teams",
        description: "Syncs TEAMS file declaration with github teams. \
                      Runs only on approved pull requests; members missing from a team are added, \
                      undeclared members are reported for manual removal.",
        who_can_use: "Anyone",
        examples: vec!["/sync-teams"],
    }])
}
