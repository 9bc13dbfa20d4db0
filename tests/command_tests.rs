use premarket_bot::commands::{parse_command, BotCommand, SEC_USAGE};

#[test]
fn parses_known_commands() {
    assert_eq!(parse_command("!", "!ping"), Some(BotCommand::Ping));
    assert_eq!(parse_command("!", "!watchlist"), Some(BotCommand::Watchlist));
    assert_eq!(parse_command("!", "!earnings"), Some(BotCommand::Earnings));
}

#[test]
fn command_names_are_case_insensitive() {
    assert_eq!(parse_command("!", "!PING"), Some(BotCommand::Ping));
    assert_eq!(parse_command("!", "  !WatchList  "), Some(BotCommand::Watchlist));
}

#[test]
fn sec_takes_an_uppercased_ticker() {
    assert_eq!(
        parse_command("!", "!sec aapl"),
        Some(BotCommand::Sec("AAPL".to_string()))
    );
    assert_eq!(
        parse_command("!", "!sec BRK.B extra words"),
        Some(BotCommand::Sec("BRK.B".to_string()))
    );
}

#[test]
fn sec_without_valid_ticker_returns_usage() {
    assert_eq!(parse_command("!", "!sec"), Some(BotCommand::Usage(SEC_USAGE)));
    assert_eq!(
        parse_command("!", "!sec <script>"),
        Some(BotCommand::Usage(SEC_USAGE))
    );
    assert_eq!(
        parse_command("!", "!sec WAYTOOLONGTICKER"),
        Some(BotCommand::Usage(SEC_USAGE))
    );
}

#[test]
fn ignores_plain_chat_and_unknown_commands() {
    assert_eq!(parse_command("!", "ping"), None);
    assert_eq!(parse_command("!", "hello there"), None);
    assert_eq!(parse_command("!", "!dance"), None);
    assert_eq!(parse_command("!", "!"), None);
    assert_eq!(parse_command("!", ""), None);
}

#[test]
fn honours_custom_prefix() {
    assert_eq!(parse_command("$", "$ping"), Some(BotCommand::Ping));
    assert_eq!(parse_command("$", "!ping"), None);
}

#[test]
fn names_are_stable_for_logging() {
    assert_eq!(BotCommand::Ping.name(), "ping");
    assert_eq!(BotCommand::Sec("X".to_string()).name(), "sec");
    assert_eq!(BotCommand::Usage(SEC_USAGE).name(), "usage");
}
