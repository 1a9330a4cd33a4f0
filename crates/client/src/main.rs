mod models;

use colored::*;
use models::*;
use reqwest::StatusCode;
use std::env;
use std::io::{self, Write};

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let backend_url = env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    let api = Api::new(backend_url);

    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", "    💡 IDEA VOTING 💡".bright_yellow().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    voting_loop(&api).await
}

// ===== Input =====

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Vote(i32),
    Refresh,
    Quit,
    Invalid,
}

fn parse_choice(input: &str) -> Choice {
    let choice = input.trim().to_lowercase();
    match choice.as_str() {
        "q" | "quit" => Choice::Quit,
        "r" | "refresh" | "" => Choice::Refresh,
        other => match other.trim_start_matches('#').parse::<i32>() {
            Ok(id) if id > 0 => Choice::Vote(id),
            _ => Choice::Invalid,
        },
    }
}

fn prompt() -> anyhow::Result<String> {
    print!("{}", "> ".bright_green().bold());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

// ===== Voting Loop =====

async fn voting_loop(api: &Api) -> anyhow::Result<()> {
    let mut ideas = api.fetch_ideas().await?;

    loop {
        render(&ideas);

        let input = prompt()?;
        match parse_choice(&input) {
            Choice::Quit => {
                println!();
                println!("{}", "Thanks for voting! 👋".bright_cyan().bold());
                return Ok(());
            }
            Choice::Refresh => {
                ideas = api.fetch_ideas().await?;
            }
            Choice::Vote(id) => {
                match api.submit_vote(id).await? {
                    VoteOutcome::Accepted(vote) => {
                        println!(
                            "{} {} ({} votes)",
                            format!("✓ {}:", vote.message).green(),
                            vote.idea.idea_name.bright_white().bold(),
                            vote.idea.votes_count.to_string().yellow()
                        );
                    }
                    VoteOutcome::Refused(message) => {
                        println!("{} {}", "✗".red().bold(), message.red());
                    }
                    VoteOutcome::Failed => {
                        println!(
                            "{}",
                            "Could not submit the vote. Please try again later.".red()
                        );
                    }
                }
                ideas = api.fetch_ideas().await?;
            }
            Choice::Invalid => {
                println!("{}", "Invalid choice. Please try again.".red());
            }
        }
    }
}

fn render(ideas: &IdeasResponse) {
    println!("{}", "━".repeat(60).bright_black());
    println!();

    if ideas.data.is_empty() {
        println!("{}", "No ideas available for voting".bright_black());
    } else {
        println!(
            "{}",
            "Ideas for the next version of our app:".bright_yellow().bold()
        );
        println!();
        for idea in &ideas.data {
            let marker = if idea.user_has_voted {
                "✓ voted".green().to_string()
            } else {
                String::new()
            };
            println!(
                "{:>4}  {}  {}",
                idea.id.to_string().bright_cyan(),
                idea.idea_name.bright_white(),
                marker
            );
        }
    }

    println!();
    println!(
        "{} {}",
        "Votes used:".bright_black(),
        ideas.voted_idea_ids.len().to_string().bright_cyan()
    );
    println!(
        "{}",
        "Vote: enter an idea number  [R]efresh  [Q]uit".bright_black()
    );
}

// ===== API Calls =====

enum VoteOutcome {
    Accepted(VoteResponse),
    /// The server turned the vote down with a message for the user.
    Refused(String),
    Failed,
}

struct Api {
    client: reqwest::Client,
    base_url: String,
}

impl Api {
    fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_ideas(&self) -> anyhow::Result<IdeasResponse> {
        let response = self
            .client
            .get(format!("{}/api/ideas-votes/get", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            anyhow::bail!("API error ({}): {}", status, text);
        }

        Ok(response.json().await?)
    }

    async fn submit_vote(&self, idea_id: i32) -> anyhow::Result<VoteOutcome> {
        let response = self
            .client
            .post(format!("{}/api/vote/create", self.base_url))
            .json(&VoteRequest { idea_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(VoteOutcome::Accepted(response.json().await?));
        }

        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::CONFLICT => {
                let message = match response.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) if status == StatusCode::NOT_FOUND => "Idea not found".to_string(),
                    Err(_) => "Bad request".to_string(),
                };
                Ok(VoteOutcome::Refused(message))
            }
            _ => Ok(VoteOutcome::Failed),
        }
    }
}
