#![no_main]

use compass_cli::parse_command_lines;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let entries = parse_command_lines(&raw);
    let mut previous_line = 0;
    for entry in entries {
        assert!(entry.line_number > previous_line);
        assert!(!entry.command.is_empty());
        assert!(!entry.command.starts_with('#'));
        assert_eq!(entry.command, entry.command.trim());
        previous_line = entry.line_number;
    }
});
