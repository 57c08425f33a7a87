//! The interactive command loop: `key`, `successor <int>`, `get <int>`,
//! `put <int> <token>`. Kept as the crate's one entry point but deliberately
//! thin. Runs on a dedicated blocking task since `std::io::stdin().lines()`
//! blocks the thread; each command is dispatched into the async `NodeCore`
//! via `Handle::block_on`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::key::Key;
use crate::node::NodeCore;

const PROMPT: &str = "\u{276F} ";

/// Runs the REPL to completion (EOF on stdin). Spawn this on a blocking
/// task; it never touches tokio I/O itself.
pub fn run(node: Arc<NodeCore>, handle: Handle) {
    let stdin = io::stdin();
    print!("{PROMPT}");
    io::stdout().flush().ok();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let response = handle.block_on(dispatch(&node, &line));
        println!("{response}");
        print!("{PROMPT}");
        io::stdout().flush().ok();
    }
}

async fn dispatch(node: &Arc<NodeCore>, line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["key"] => node.self_key().to_string(),
        ["successor", arg] => match parse_key(node, arg) {
            Ok(key) => match node.find_successor(key).await {
                Ok(peer) => match peer.key().await {
                    Ok(k) => k.to_string(),
                    Err(e) => format!("error: {e}"),
                },
                Err(e) => format!("error: {e}"),
            },
            Err(msg) => msg,
        },
        ["get", arg] => match parse_key(node, arg) {
            Ok(key) => match node.get(key).await {
                Ok(value) => format!("{{{}: {}}}", key, render_value(value)),
                Err(e) => format!("error: {e}"),
            },
            Err(msg) => msg,
        },
        ["put", key_arg, value_arg] => match parse_key(node, key_arg) {
            Ok(key) => match node.put(key, value_arg.as_bytes().to_vec()).await {
                Ok(Some(previous)) => format!(
                    "{{{}: {} -> {}}}",
                    key,
                    String::from_utf8_lossy(&previous),
                    value_arg
                ),
                Ok(None) => format!("{{{}: {}}}", key, value_arg),
                Err(e) => format!("error: {e}"),
            },
            Err(msg) => msg,
        },
        [] => String::new(),
        _ => format!("unknown command or wrong number of arguments: '{line}'"),
    }
}

fn parse_key(node: &Arc<NodeCore>, arg: &str) -> Result<Key, String> {
    match arg.parse::<u64>() {
        Ok(v) => Ok(Key::new(v, node.config().key_bits)),
        Err(_) => Err(format!("invalid key '{arg}': expected a non-negative integer")),
    }
}

fn render_value(value: Option<Vec<u8>>) -> String {
    match value {
        Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        None => "null".to_string(),
    }
}
