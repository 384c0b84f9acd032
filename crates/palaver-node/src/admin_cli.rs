//! palaver-admin CLI tool
//!
//! Drives a Palaver session from the host machine.
//!
//! Usage:
//!   palaver-admin create-session [secs]
//!   palaver-admin sessions
//!   palaver-admin status <session_id>
//!   palaver-admin participants <session_id>
//!   palaver-admin assign-roles <session_id>
//!   palaver-admin start <session_id>
//!   palaver-admin end <session_id>
//!   palaver-admin debrief <session_id>
//!   palaver-admin ping

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use palaver_core::format_mmss;
use palaver_node::admin_socket::{AdminCommand, AdminResponse};
use palaver_node::models::{now_ms, Participant, Session, Team};
use palaver_node::service::{Debrief, Seating};

fn print_usage() {
    eprintln!("palaver-admin - Drive a Palaver session from the host machine");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  palaver-admin create-session [secs]      Open a session (default 900s timer)");
    eprintln!("  palaver-admin sessions                   List every session on record");
    eprintln!("  palaver-admin status <session_id>        Session status and clock");
    eprintln!("  palaver-admin participants <session_id>  Roster in join order");
    eprintln!("  palaver-admin assign-roles <session_id>  Form teams and seat everyone");
    eprintln!("  palaver-admin start <session_id>         Start the negotiation");
    eprintln!("  palaver-admin end <session_id>           End the session, free the code");
    eprintln!("  palaver-admin debrief <session_id>       Answers and activity per team");
    eprintln!("  palaver-admin ping                       Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PALAVER_SOCKET  Path to admin socket (default: ./palaver-data/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("PALAVER_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./palaver-data/admin.sock"))
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to palaver-node at {:?}: {}\n\
             Is the palaver-node running?",
            socket_path, e
        )
    })?;

    // Send command
    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    // Read response
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn session_id_arg(args: &[String], command: &str) -> String {
    match args.get(2) {
        Some(id) => id.clone(),
        None => {
            eprintln!("Error: {} requires a session_id argument", command);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "create-session" => {
            let timer_duration = match args.get(2) {
                Some(raw) => match raw.parse::<u64>() {
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        eprintln!("Error: timer duration must be a number of seconds");
                        std::process::exit(1);
                    }
                },
                None => None,
            };
            AdminCommand::CreateSession { timer_duration }
        }
        "sessions" => AdminCommand::Sessions,
        "status" => AdminCommand::Status {
            session_id: session_id_arg(&args, "status"),
        },
        "participants" => AdminCommand::Participants {
            session_id: session_id_arg(&args, "participants"),
        },
        "assign-roles" => AdminCommand::AssignRoles {
            session_id: session_id_arg(&args, "assign-roles"),
        },
        "start" => AdminCommand::Start {
            session_id: session_id_arg(&args, "start"),
        },
        "end" => AdminCommand::End {
            session_id: session_id_arg(&args, "end"),
        },
        "debrief" => AdminCommand::Debrief {
            session_id: session_id_arg(&args, "debrief"),
        },
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::Session { session } => {
                print_session(&session);
            }
            AdminResponse::SessionList { sessions } => {
                if sessions.is_empty() {
                    println!("(none)");
                } else {
                    for session in sessions {
                        print_session_line(&session);
                    }
                }
            }
            AdminResponse::Roster {
                participants,
                teams,
            } => {
                print_roster(&participants, &teams);
            }
            AdminResponse::Seated { seating } => {
                print_seating(&seating);
            }
            AdminResponse::DebriefReport { debrief } => {
                print_debrief(&debrief);
            }
            AdminResponse::Pong => {
                println!("pong - palaver-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn fluency_label(participant: &Participant) -> &'static str {
    match participant.is_native_speaker {
        Some(true) => "native",
        Some(false) => "non-native",
        None => "-",
    }
}

fn print_session(session: &Session) {
    println!("session   {}", session.id);
    println!("join code {}", session.game_pin);
    println!("status    {}", session.status);
    println!(
        "timer     {} ({}s)",
        format_mmss(session.timer_duration),
        session.timer_duration
    );
    if let Some(remaining) = session.remaining_secs(now_ms()) {
        println!("remaining {}", format_mmss(remaining));
    }
}

fn print_session_line(session: &Session) {
    println!(
        "{}  {:<11}  pin {}  timer {}s",
        session.id,
        session.status.as_str(),
        session.game_pin,
        session.timer_duration
    );
}

fn print_roster(participants: &[Participant], teams: &[Team]) {
    if participants.is_empty() {
        println!("(empty lobby)");
        return;
    }
    let numbers: HashMap<&str, u32> = teams
        .iter()
        .map(|t| (t.id.as_str(), t.team_number))
        .collect();
    for p in participants {
        let team = p
            .team_id
            .as_deref()
            .and_then(|id| numbers.get(id))
            .map(|n| format!("team {}", n))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<14} {:<11} {:<7} {}",
            p.name,
            p.role_label(),
            fluency_label(p),
            team,
            p.id
        );
    }
}

fn print_seating(seating: &Seating) {
    println!("{} teams seated", seating.teams.len());
    for team in &seating.teams {
        let members: Vec<&Participant> = seating
            .participants
            .iter()
            .filter(|p| p.team_id.as_deref() == Some(team.id.as_str()))
            .collect();
        println!();
        println!("team {} ({} seats)", team.team_number, members.len());
        for p in members {
            println!("  {:<24} {:<14} {}", p.name, p.role_label(), fluency_label(p));
        }
    }
}

fn print_debrief(debrief: &Debrief) {
    print_session(&debrief.session);
    for team in &debrief.teams {
        println!();
        println!(
            "team {} - {} members, {} messages",
            team.team.team_number,
            team.members.len(),
            team.message_count
        );
        for p in &team.members {
            println!("  {:<24} {}", p.name, p.role_label());
        }
        if team.answers.is_empty() {
            println!("  (no answers submitted)");
        } else {
            for answer in &team.answers {
                let question = answer.question().unwrap_or("(unknown question)");
                println!("  Q{}: {}", answer.question_number, question);
                println!("      {}", answer.answer_text);
            }
        }
    }
}
