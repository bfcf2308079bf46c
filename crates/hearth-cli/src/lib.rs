//! Provisioning command for operator credentials.
//!
//! Prompts for a plaintext password without echoing it and prints the digest
//! to paste into `[http.api_users.<user>] password_hash`. The digest comes
//! from the same hasher the gateway verifies against, so a value produced
//! here always round-trips.

use std::io::{self, BufRead};

use clap::Parser;
use hearth_auth::hash_password;

/// Derive a stored password digest for the settings file.
#[derive(Debug, Parser)]
#[command(name = "hearth-hashpw", version)]
struct Cli {
    /// Read the password from the first line of stdin instead of prompting.
    #[arg(long)]
    stdin: bool,
}

/// Parses arguments, reads the password, and prints the digest. Returns the
/// process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();

    let password = if cli.stdin {
        read_password_line(&mut io::stdin().lock())
    } else {
        rpassword::prompt_password("Enter plain password: ").map_err(|err| err.to_string())
    };

    match password {
        Ok(password) => {
            println!("{}", hash_password(&password));
            0
        }
        Err(message) => {
            eprintln!("error: {message}");
            1
        }
    }
}

fn read_password_line(reader: &mut impl BufRead) -> Result<String, String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|err| err.to_string())?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err("no password supplied on stdin".to_string());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_password_is_trimmed_of_line_endings() {
        let mut input = io::Cursor::new(b"hunter2\r\n".to_vec());
        assert_eq!(read_password_line(&mut input).unwrap(), "hunter2");
    }

    #[test]
    fn empty_stdin_is_an_error() {
        let mut input = io::Cursor::new(b"\n".to_vec());
        assert!(read_password_line(&mut input).is_err());
    }

    #[test]
    fn digest_round_trips_with_the_verifier() {
        use std::collections::BTreeMap;

        let digest = hash_password("pw1");
        let mut users = BTreeMap::new();
        users.insert("alice".to_string(), digest);
        let verifier = hearth_auth::CredentialVerifier::new(None, users);
        assert!(verifier.verify("pw1").authenticated);
    }
}
