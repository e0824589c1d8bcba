//! Console line grammar.

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `join <name> [x y z]`
    Join {
        name: String,
        position: Option<(f32, f32, f32)>,
    },
    /// `quit <name>`
    Quit { name: String },
    /// `as <name> <command...>`
    As { name: String, line: String },
    /// `damage <name> <amount>`
    Damage { name: String, amount: f32 },
    /// `hunger <name>`
    Hunger { name: String },
    /// `tab <name> <partial command...>`
    Tab { name: String, line: String },
    /// `list`
    List,
    /// `help`
    Help,
    /// `stop`
    Stop,
    /// Anything else runs as a command from the console.
    Run(String),
}

pub const HELP: &[&str] = &[
    "join <name> [x y z]   connect a player",
    "quit <name>           disconnect a player",
    "as <name> <command>   run a command as a player",
    "damage <name> <amt>   hurt a player",
    "hunger <name>         drain one food point",
    "tab <name> <command>  show completions",
    "list                  online players",
    "stop                  shut down",
];

fn rest_after(line: &str, words: usize) -> String {
    line.split_whitespace()
        .skip(words)
        .collect::<Vec<_>>()
        .join(" ")
}

fn name_arg(parts: &[&str], usage: &str) -> Result<String, String> {
    parts
        .get(1)
        .map(|name| name.to_string())
        .ok_or_else(|| format!("Usage: {usage}"))
}

/// Parse one console line. `Err` carries a usage message.
pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Err("Empty command".to_string());
    };

    match first.to_lowercase().as_str() {
        "join" => {
            let name = name_arg(&parts, "join <name> [x y z]")?;
            let position = match &parts[2..] {
                [] => None,
                [x, y, z] => {
                    let coord = |s: &str| {
                        s.parse::<f32>()
                            .map_err(|_| format!("Invalid coordinate: {s}"))
                    };
                    Some((coord(*x)?, coord(*y)?, coord(*z)?))
                }
                _ => return Err("Usage: join <name> [x y z]".to_string()),
            };
            Ok(ConsoleCommand::Join { name, position })
        }
        "quit" => Ok(ConsoleCommand::Quit {
            name: name_arg(&parts, "quit <name>")?,
        }),
        "as" | "tab" => {
            let usage = format!("{first} <name> <command...>");
            let name = name_arg(&parts, &usage)?;
            let rest = rest_after(line, 2);
            let rest = rest.trim_start_matches('/').to_string();
            if rest.is_empty() {
                return Err(format!("Usage: {usage}"));
            }
            if first.eq_ignore_ascii_case("as") {
                Ok(ConsoleCommand::As { name, line: rest })
            } else {
                Ok(ConsoleCommand::Tab { name, line: rest })
            }
        }
        "damage" => {
            let name = name_arg(&parts, "damage <name> <amount>")?;
            let amount = parts
                .get(2)
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|a| *a >= 0.0)
                .ok_or_else(|| "Usage: damage <name> <amount>".to_string())?;
            Ok(ConsoleCommand::Damage { name, amount })
        }
        "hunger" => Ok(ConsoleCommand::Hunger {
            name: name_arg(&parts, "hunger <name>")?,
        }),
        "list" => Ok(ConsoleCommand::List),
        "help" => Ok(ConsoleCommand::Help),
        "stop" => Ok(ConsoleCommand::Stop),
        _ => Ok(ConsoleCommand::Run(line.trim_start_matches('/').to_string())),
    }
}

/// Split a command line into its label and arguments. A trailing space
/// yields an empty last argument, which is what completion works on.
pub fn split_command(line: &str) -> (String, Vec<String>) {
    let mut parts = line.split(' ').filter(|p| !p.is_empty());
    let label = parts.next().unwrap_or_default().to_lowercase();
    let mut args: Vec<String> = parts.map(String::from).collect();
    if line.ends_with(' ') {
        args.push(String::new());
    }
    (label, args)
}

/// Drop `§x` formatting codes for terminal output.
pub fn strip_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_join() {
        assert_eq!(
            parse("join Alice"),
            Ok(ConsoleCommand::Join {
                name: "Alice".into(),
                position: None
            })
        );
        assert_eq!(
            parse("join Bob 10 64.5 -3"),
            Ok(ConsoleCommand::Join {
                name: "Bob".into(),
                position: Some((10.0, 64.5, -3.0))
            })
        );
        assert!(parse("join").is_err());
        assert!(parse("join Bob 1 2").is_err());
        assert_eq!(parse("join Bob x 2 3"), Err("Invalid coordinate: x".to_string()));
    }

    #[test]
    fn parse_player_actions() {
        assert_eq!(
            parse("quit Alice"),
            Ok(ConsoleCommand::Quit {
                name: "Alice".into()
            })
        );
        assert_eq!(
            parse("as Alice /tpa   Bob"),
            Ok(ConsoleCommand::As {
                name: "Alice".into(),
                line: "tpa Bob".into()
            })
        );
        assert!(parse("as Alice").is_err());
        assert_eq!(
            parse("damage Bob 4.5"),
            Ok(ConsoleCommand::Damage {
                name: "Bob".into(),
                amount: 4.5
            })
        );
        assert!(parse("damage Bob -1").is_err());
        assert!(parse("damage Bob").is_err());
        assert_eq!(
            parse("HUNGER Bob"),
            Ok(ConsoleCommand::Hunger { name: "Bob".into() })
        );
        assert_eq!(
            parse("tab Alice gm c"),
            Ok(ConsoleCommand::Tab {
                name: "Alice".into(),
                line: "gm c".into()
            })
        );
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse("list"), Ok(ConsoleCommand::List));
        assert_eq!(parse(" stop "), Ok(ConsoleCommand::Stop));
        assert_eq!(parse("help"), Ok(ConsoleCommand::Help));
        assert_eq!(
            parse("/gm creative Alice"),
            Ok(ConsoleCommand::Run("gm creative Alice".into()))
        );
        assert!(parse("   ").is_err());
    }

    #[test]
    fn split_keeps_trailing_empty_arg() {
        assert_eq!(
            split_command("TPA Bob"),
            ("tpa".to_string(), vec!["Bob".to_string()])
        );
        assert_eq!(
            split_command("gm c "),
            ("gm".to_string(), vec!["c".to_string(), String::new()])
        );
        assert_eq!(split_command("tpaccept"), ("tpaccept".to_string(), vec![]));
    }

    #[test]
    fn strip_colors_removes_codes() {
        assert_eq!(strip_colors("§aHello §eBob§r!"), "Hello Bob!");
        assert_eq!(strip_colors("plain"), "plain");
    }
}
