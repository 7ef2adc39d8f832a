#![no_main]

use compass_cli::{parse_repl_input, split_command_args, ReplInput, COMMAND_NAMES};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    match parse_repl_input(&raw) {
        ReplInput::Empty => assert!(raw.trim().is_empty()),
        ReplInput::Command(command) => {
            assert!(COMMAND_NAMES.contains(&command.name));
            assert_eq!(command.args, command.args.trim());
            if let Ok(parts) = split_command_args(command.args) {
                assert!(parts.len() <= command.args.len());
            }
        }
        ReplInput::Query(query) => {
            assert!(!query.is_empty());
            assert_eq!(query, raw.trim());
        }
    }
});
