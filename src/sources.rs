use anyhow::Result;

use crate::config::Config;

/// Print the configured sources and whether their credentials are present.
pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<40} CREDENTIALS", "SOURCE", "ENDPOINT");

    print_source(
        "notion",
        &config.knowledge_base.api_base,
        env_status("NOTION_API_KEY"),
    );
    print_source(
        "drive",
        &config.file_store.api_base,
        env_status("DRIVE_API_TOKEN"),
    );

    let jira_creds = if env_set("JIRA_EMAIL") && env_set("JIRA_API_TOKEN") {
        "OK"
    } else {
        "MISSING (JIRA_EMAIL, JIRA_API_TOKEN)"
    };
    print_source("jira", "from overview property", jira_creds);

    if config.summarization.is_enabled() {
        print_source(
            "openai",
            &config.summarization.model,
            env_status("OPENAI_API_KEY"),
        );
    }

    Ok(())
}

fn print_source(name: &str, endpoint: &str, credentials: &str) {
    println!("{:<16} {:<40} {}", name, endpoint, credentials);
}

fn env_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

fn env_status(name: &str) -> &'static str {
    if env_set(name) {
        "OK"
    } else {
        "MISSING"
    }
}
