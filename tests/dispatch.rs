use serialcmd::*;
use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

std::thread_local! {
    /// Tokens seen by the capturing handlers, one entry per call
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone, PartialEq)]
struct Call {
    name: &'static str,
    tokens: Vec<String>,
    line: String,
    args: Option<String>,
}

fn record(name: &'static str, params: &Params<'_>) {
    let call = Call {
        name,
        tokens: params.iter().map(str::to_string).collect(),
        line: params.line().to_string(),
        args: params.args().map(str::to_string),
    };
    CALLS.with(|calls| calls.borrow_mut().push(call));
}

fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
}

fn ping(params: &Params<'_>) {
    record("ping", params);
}

fn cmd(params: &Params<'_>) {
    record("cmd", params);
}

fn echo(params: &Params<'_>) {
    record("echo", params);
}

fn helo(params: &Params<'_>) {
    record("helo", params);
}

const PING: u32 = hash("ping");
const CMD: u32 = hash("cmd");
const ECHO: u32 = hash("echo");
const HELO: u32 = hash("helo");

fn handler() -> CommandHandler<8, 32> {
    let mut handler = CommandHandler::new();
    handler.register(PING, Arity::Exactly(0), ping).unwrap();
    handler.register(CMD, Arity::Exactly(2), cmd).unwrap();
    handler.register(ECHO, Arity::Any, echo).unwrap();
    handler.register(HELO, Arity::Exactly(3), helo).unwrap();
    take_calls();
    handler
}

fn run(handler: &mut CommandHandler<8, 32>, input: &[u8]) -> Result<(), Error> {
    handler.ingest_all(input)?;
    handler.execute()
}

#[test]
fn test_ping_round_trip() {
    let mut handler = handler();

    for &byte in b"PING\n" {
        assert_eq!(handler.ingest(byte), Ok(()));
    }
    assert!(handler.command_waiting());
    assert_eq!(handler.execute(), Ok(()));

    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "ping");
    assert_eq!(calls[0].tokens, vec!["PING"]);
}

#[test]
fn test_handler_sees_tokens_and_line() {
    let mut handler = handler();
    assert_eq!(run(&mut handler, b"HELO 1 2 3.3\r\n"), Ok(()));

    let calls = take_calls();
    assert_eq!(calls[0].tokens, vec!["HELO", "1", "2", "3.3"]);
    assert_eq!(calls[0].line, "HELO 1 2 3.3");
    assert_eq!(calls[0].args.as_deref(), Some("1 2 3.3"));
}

#[test]
fn test_arity_enforcement() {
    let mut handler = handler();

    assert_eq!(run(&mut handler, b"CMD 1\n"), Err(Error::WrongParameterCount));
    assert!(take_calls().is_empty());

    assert_eq!(run(&mut handler, b"CMD 1 2\n"), Ok(()));
    assert_eq!(take_calls()[0].tokens, vec!["CMD", "1", "2"]);

    assert_eq!(run(&mut handler, b"CMD   1 \t 2  \n"), Ok(()));
    assert_eq!(take_calls()[0].tokens, vec!["CMD", "1", "2"]);
}

#[test]
fn test_any_arity_accepts_everything() {
    let mut handler = handler();

    assert_eq!(run(&mut handler, b"echo\n"), Ok(()));
    assert_eq!(run(&mut handler, b"echo a\n"), Ok(()));
    assert_eq!(run(&mut handler, b"echo a b c d e f\n"), Ok(()));

    let counts: Vec<usize> = take_calls().iter().map(|c| c.tokens.len() - 1).collect();
    assert_eq!(counts, vec![0, 1, 6]);
}

#[test]
fn test_unregistered_command() {
    let mut handler = handler();
    assert_eq!(run(&mut handler, b"FOO\n"), Err(Error::CommandNotFound));
    assert!(take_calls().is_empty());
}

#[test]
fn test_empty_line() {
    let mut handler = handler();
    assert_eq!(run(&mut handler, b"\n"), Err(Error::EmptyCommandString));
    assert_eq!(run(&mut handler, b"\r\n"), Err(Error::EmptyCommandString));
}

#[test]
fn test_no_command_waiting() {
    let mut handler = handler();
    assert_eq!(handler.execute(), Err(Error::NoCommandWaiting));
}

#[test]
fn test_overflow_then_recovery() {
    let mut handler = handler();
    let max = 32 - 1;

    for _ in 0..max {
        assert_eq!(handler.ingest(b'x'), Ok(()));
    }
    assert_eq!(handler.ingest(b'x'), Err(Error::CommandTooLong));
    assert_eq!(handler.ingest(b'y'), Err(Error::CommandTooLong));
    assert_eq!(handler.pending().len(), max);

    assert_eq!(handler.ingest(b'\n'), Ok(()));
    assert_eq!(handler.execute(), Err(Error::CommandTooLong));
    assert!(handler.pending().is_empty());
    assert!(!handler.command_waiting());

    assert_eq!(run(&mut handler, b"ping\n"), Ok(()));
    assert_eq!(take_calls()[0].tokens, vec!["ping"]);
}

#[test]
fn test_longest_line_fits() {
    let mut handler = handler();

    // 31 bytes: "echo" plus 27 more
    let line = format!("echo {}", "a".repeat(26));
    assert_eq!(line.len(), 31);
    assert_eq!(run(&mut handler, format!("{}\n", line).as_bytes()), Ok(()));
    assert_eq!(take_calls()[0].line, line);
}

#[test]
fn test_buffer_full_rejects_input() {
    let mut handler = handler();
    handler.ingest_all(b"CMD 1 2\n").unwrap();

    assert_eq!(handler.ingest(b'z'), Err(Error::BufferFull));
    assert_eq!(handler.ingest(b'\n'), Err(Error::BufferFull));
    assert_eq!(handler.ingest(b'\r'), Err(Error::BufferFull));
    assert!(handler.buffer_full());
    assert_eq!(handler.pending(), b"CMD 1 2");

    assert_eq!(handler.execute(), Ok(()));
    assert_eq!(take_calls()[0].tokens, vec!["CMD", "1", "2"]);
}

#[test]
fn test_no_state_leaks_between_commands() {
    let mut handler = handler();
    let outcomes: [(&[u8], Result<(), Error>); 6] = [
        (b"\n", Err(Error::EmptyCommandString)),
        (b"FOO 1 2 3\n", Err(Error::CommandNotFound)),
        (b"CMD\n", Err(Error::WrongParameterCount)),
        (b"echo a b\n", Ok(())),
        (&[0xFF, 0xFE, b'\n'], Err(Error::ParseError)),
        (b"HELO 1 2 3\n", Ok(())),
    ];

    for (input, expected) in outcomes {
        assert_eq!(run(&mut handler, input), expected);

        // The next command behaves like the very first one
        assert_eq!(run(&mut handler, b"ping\n"), Ok(()));
        let calls = take_calls();
        let last = calls.last().unwrap();
        assert_eq!(last.name, "ping");
        assert_eq!(last.tokens, vec!["ping"]);
        assert_eq!(last.line, "ping");
    }
}

#[test]
fn test_case_insensitive_dispatch() {
    let mut handler = handler();
    for line in [&b"ping\n"[..], b"PING\n", b"PiNg\n"] {
        assert_eq!(run(&mut handler, line), Ok(()));
    }
    assert_eq!(take_calls().len(), 3);
}

#[test]
fn test_registration_limits() {
    let mut handler: CommandHandler<2, 16> = CommandHandler::new();
    handler.register(PING, Arity::Exactly(0), ping).unwrap();
    assert_eq!(
        handler.register_keyword("Ping", Arity::Any, echo),
        Err(Error::DuplicateCommand)
    );
    handler.register(ECHO, Arity::Any, echo).unwrap();
    assert_eq!(
        handler.register(CMD, Arity::Exactly(2), cmd),
        Err(Error::OutOfCapacity)
    );
    assert_eq!(handler.table().len(), 2);
    assert_eq!(handler.table().capacity(), 2);
}

#[test]
fn test_garbled_stream_never_wedges() {
    let mut handler = handler();
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..2_000 {
        let byte: u8 = if rng.gen_bool(0.05) { b'\n' } else { rng.r#gen() };
        match handler.ingest(byte) {
            Ok(()) | Err(Error::CommandTooLong) => {}
            Err(Error::BufferFull) => unreachable!("lines are drained immediately"),
            Err(other) => panic!("unexpected ingest error {:?}", other),
        }

        if handler.command_waiting() {
            let _ = handler.execute();
            assert!(handler.pending().is_empty());
            assert!(!handler.command_waiting());
        }
    }

    handler.discard();
    take_calls();
    assert_eq!(run(&mut handler, b"ping\n"), Ok(()));
    assert_eq!(take_calls().len(), 1);
}
