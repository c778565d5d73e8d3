// Command-line surface over the API client

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Subcommand};
use dialoguer::Password;
use serde::Serialize;
use std::path::PathBuf;

use crate::api::{AnswerDraft, ApplicantOrdering, ApplicationDraft, IdentityLookup};
use crate::http_client::ApiClient;
use crate::models::{NewAccount, NewApplicant, NewClub, QuestionType};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long, env = "CLUB_RECRUIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "CLUB_RECRUIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        club: Option<i64>,
    },

    /// Manage clubs
    #[command(subcommand)]
    Clubs(ClubCommand),

    /// Manage a club's application forms
    Applications {
        #[arg(long)]
        club: i64,
        #[command(subcommand)]
        action: ApplicationCommand,
    },

    /// Manage the questions of an application form
    Questions {
        #[arg(long)]
        club: i64,
        #[arg(long)]
        form: i64,
        #[command(subcommand)]
        action: QuestionCommand,
    },

    /// Review applicants
    #[command(subcommand)]
    Applicants(ApplicantCommand),

    /// List all submissions
    Submissions,

    /// Apply to a club's application form
    Apply(ApplyArgs),
}

#[derive(Subcommand, Debug)]
pub enum ClubCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        club_id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ApplicationCommand {
    List,
    Show { form: i64 },
    Create { title: String },
    Delete { form: i64 },
}

#[derive(Subcommand, Debug)]
pub enum QuestionCommand {
    List,
    Add {
        prompt: String,
        #[arg(long, default_value = "Short", value_parser = parse_question_type)]
        kind: QuestionType,
        /// Mark the question as not required
        #[arg(long)]
        optional: bool,
    },
    Delete { question: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ApplicantCommand {
    List {
        /// Sort field, `-field` for descending
        #[arg(long, value_parser = parse_ordering)]
        ordering: Option<ApplicantOrdering>,
    },
    Show { id: i64 },
    Delete { id: i64 },
    /// Submissions for one form joined with applicants and questions
    Overview {
        #[arg(long)]
        club: i64,
        #[arg(long)]
        form: i64,
        #[arg(long, value_parser = parse_ordering)]
        ordering: Option<ApplicantOrdering>,
    },
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[arg(long)]
    pub club: i64,
    #[arg(long)]
    pub form: i64,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub year: String,
    /// Text answer as `QUESTION=TEXT`
    #[arg(long = "answer", value_parser = parse_text_answer)]
    pub answers: Vec<(i64, String)>,
    /// File answer as `QUESTION=PATH`
    #[arg(long = "file", value_parser = parse_file_answer)]
    pub files: Vec<(i64, PathBuf)>,
}

fn split_assignment(s: &str) -> Result<(i64, &str), String> {
    let (question, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=VALUE, got '{}'", s))?;
    let question = question
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("question id must be a number, got '{}'", question))?;
    Ok((question, value))
}

fn parse_text_answer(s: &str) -> Result<(i64, String), String> {
    let (question, text) = split_assignment(s)?;
    Ok((question, text.to_string()))
}

fn parse_file_answer(s: &str) -> Result<(i64, PathBuf), String> {
    let (question, path) = split_assignment(s)?;
    if path.is_empty() {
        return Err(format!("missing file path for question {}", question));
    }
    Ok((question, PathBuf::from(path)))
}

fn parse_question_type(s: &str) -> Result<QuestionType, String> {
    QuestionType::parse(s)
        .ok_or_else(|| format!("unknown question type '{}' (Short, Long, Multi-Select, File)", s))
}

fn parse_ordering(s: &str) -> Result<ApplicantOrdering, String> {
    ApplicantOrdering::parse(s).ok_or_else(|| format!("invalid ordering '{}'", s))
}

fn prompt_password(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one command against the API
pub async fn run(command: Command, client: &ApiClient) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = prompt_password(password)?;
            let outcome = client.login(&username, &password).await?;
            match outcome.identity {
                IdentityLookup::Resolved(identity) => match identity.club {
                    Some(club) => println!("Logged in as {} (club {})", identity.username, club),
                    None => println!("Logged in as {}", identity.username),
                },
                IdentityLookup::NotListed(identity) => {
                    println!("Logged in as {} (not found in user listing)", identity.username)
                }
                IdentityLookup::Unavailable { identity, reason } => {
                    println!("Logged in as {} (user lookup failed: {})", identity.username, reason)
                }
            }
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let state = client.session().init()?;
            match (state.is_authenticated(), state.user) {
                (true, Some(user)) => print_json(&user)?,
                (true, None) => println!("Logged in (identity unknown)"),
                (false, _) => println!("Not logged in"),
            }
        }
        Command::Register {
            username,
            email,
            password,
            club,
        } => {
            let password = prompt_password(password)?;
            let account = NewAccount {
                username,
                email,
                password,
                club,
            };
            print_json(&client.register(&account).await?)?;
        }
        Command::Clubs(action) => match action {
            ClubCommand::List => print_json(&client.list_clubs().await?)?,
            ClubCommand::Create { name, club_id } => {
                print_json(&client.create_club(&NewClub { name, club_id }).await?)?
            }
        },
        Command::Applications { club, action } => match action {
            ApplicationCommand::List => print_json(&client.list_applications(club).await?)?,
            ApplicationCommand::Show { form } => {
                print_json(&client.get_application(club, form).await?)?
            }
            ApplicationCommand::Create { title } => {
                print_json(&client.create_application(club, &title).await?)?
            }
            ApplicationCommand::Delete { form } => {
                client.delete_application(club, form).await?;
                println!("Deleted application {}", form);
            }
        },
        Command::Questions { club, form, action } => match action {
            QuestionCommand::List => print_json(&client.list_questions(club, form).await?)?,
            QuestionCommand::Add {
                prompt,
                kind,
                optional,
            } => {
                let question = client
                    .create_question(club, form, &prompt, kind, !optional)
                    .await?;
                print_json(&question)?
            }
            QuestionCommand::Delete { question } => {
                client.delete_question(club, form, question).await?;
                println!("Deleted question {}", question);
            }
        },
        Command::Applicants(action) => match action {
            ApplicantCommand::List { ordering } => {
                print_json(&client.list_applicants(ordering.as_ref()).await?)?
            }
            ApplicantCommand::Show { id } => print_json(&client.get_applicant(id).await?)?,
            ApplicantCommand::Delete { id } => {
                client.delete_applicant(id).await?;
                println!("Deleted applicant {}", id);
            }
            ApplicantCommand::Overview {
                club,
                form,
                ordering,
            } => print_json(&client.applicant_overview(club, form, ordering.as_ref()).await?)?,
        },
        Command::Submissions => print_json(&client.list_submissions().await?)?,
        Command::Apply(args) => {
            let draft = build_draft(args).await?;
            print_json(&client.submit_application(&draft).await?)?;
        }
    }

    Ok(())
}

async fn build_draft(args: ApplyArgs) -> Result<ApplicationDraft> {
    let mut answers: Vec<AnswerDraft> = args
        .answers
        .into_iter()
        .map(|(question, text)| AnswerDraft::Text { question, text })
        .collect();

    for (question, path) in args.files {
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        answers.push(AnswerDraft::File {
            question,
            file_name,
            data: Bytes::from(data),
        });
    }

    Ok(ApplicationDraft {
        applicant: NewApplicant {
            first_name: args.first_name,
            last_name: args.last_name,
            year: args.year,
            club_association: args.club,
            application: args.form,
        },
        answers,
    })
}
