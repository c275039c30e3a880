use std::io::{self, Write};

use async_trait::async_trait;
use flowdeck_core::{PickItem, Picker, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum Selection {
    Index(usize),
    Cancel,
    Invalid,
}

fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return Selection::Cancel;
    }
    match input.parse::<usize>() {
        Ok(number) if (1..=count).contains(&number) => Selection::Index(number - 1),
        _ => Selection::Invalid,
    }
}

/// Numbered prompt on the terminal. Empty input, `q` or end of input cancels.
pub struct StdinPicker;

#[async_trait]
impl Picker for StdinPicker {
    async fn pick(&self, items: &[PickItem]) -> Result<Option<usize>> {
        println!("Select a workflow:");
        for (index, item) in items.iter().enumerate() {
            match &item.description {
                Some(description) => println!("  {}) {} - {}", index + 1, item.label, description),
                None => println!("  {}) {}", index + 1, item.label),
            }
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("number (enter to cancel)> ");
            io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            match parse_selection(&line, items.len()) {
                Selection::Index(index) => return Ok(Some(index)),
                Selection::Cancel => return Ok(None),
                Selection::Invalid => println!("Enter a number between 1 and {}.", items.len()),
            }
        }
    }
}
