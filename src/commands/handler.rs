//! Command Handler
//!
//! Maps one command (a name plus byte-string arguments) onto one
//! [`StringStore`] call and turns the outcome into a [`Reply`].
//!
//! This is the boundary layer: arity checks, integer/float argument parsing,
//! SET option parsing and the even-argument rule of MSET/MSETNX all live here.
//! The store itself only ever sees well-typed arguments.
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value [NX|XX] [EX seconds|PX milliseconds|KEEPTTL] [GET]`
//! - `GET key`, `GETSET key value`, `GETDEL key`
//! - `SETNX key value`, `SETEX key seconds value`, `PSETEX key ms value`
//! - `APPEND key value`, `STRLEN key`
//! - `GETRANGE key start end`, `SETRANGE key offset value`
//! - `GETBIT key offset`, `SETBIT key offset bit`, `BITCOUNT key [start end]`
//! - `INCR key`, `INCRBY key increment`, `INCRBYFLOAT key increment`
//! - `DECR key`, `DECRBY key decrement`
//! - `MGET key [key ...]`, `MSET key value [key value ...]`,
//!   `MSETNX key value [key value ...]`
//!
//! ### Key Commands
//! - `DEL key [key ...]`, `EXISTS key [key ...]`
//! - `EXPIRE key seconds`, `PEXPIRE key milliseconds`, `PERSIST key`
//! - `TTL key`, `PTTL key`
//!
//! ### Server Commands
//! - `PING [message]`, `ECHO message`, `DBSIZE`, `FLUSHDB`, `FLUSHALL`

use crate::commands::Reply;
use crate::storage::numeric;
use crate::storage::{SetOptions, StoreError, StringStore, TtlState};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Why a command could not be executed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("syntax error")]
    Syntax,

    #[error("value is not an integer or out of range")]
    NotAnInteger,

    #[error("value is not a valid float")]
    NotAFloat,

    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type CommandResult = Result<Reply, CommandError>;

/// Executes commands against a shared [`StringStore`].
#[derive(Clone)]
pub struct CommandHandler {
    store: Arc<StringStore>,
}

impl CommandHandler {
    /// Creates a new command handler with the given store.
    pub fn new(store: Arc<StringStore>) -> Self {
        Self { store }
    }

    /// The store this handler executes against.
    pub fn store(&self) -> &Arc<StringStore> {
        &self.store
    }

    /// Executes a command and returns the reply.
    ///
    /// `args[0]` is the command name (case-insensitive); the rest are its
    /// arguments. Failures come back as [`Reply::Error`].
    pub fn execute(&self, args: &[Bytes]) -> Reply {
        let Some((name, rest)) = args.split_first() else {
            return Reply::error("ERR empty command");
        };
        let cmd = String::from_utf8_lossy(name).to_ascii_uppercase();
        debug!(command = %cmd, argc = rest.len(), "Executing command");

        match self.dispatch(&cmd, rest) {
            Ok(reply) => reply,
            Err(e) => Reply::error(format!("ERR {}", e)),
        }
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[Bytes]) -> CommandResult {
        match cmd {
            // String commands
            "GET" => self.cmd_get(args),
            "SET" => self.cmd_set(args),
            "SETNX" => self.cmd_setnx(args),
            "SETEX" => self.cmd_setex(args, "setex", MILLIS_PER_SEC),
            "PSETEX" => self.cmd_setex(args, "psetex", 1),
            "GETSET" => self.cmd_getset(args),
            "GETDEL" => self.cmd_getdel(args),
            "APPEND" => self.cmd_append(args),
            "STRLEN" => self.cmd_strlen(args),
            "GETRANGE" => self.cmd_getrange(args),
            "SETRANGE" => self.cmd_setrange(args),
            "GETBIT" => self.cmd_getbit(args),
            "SETBIT" => self.cmd_setbit(args),
            "BITCOUNT" => self.cmd_bitcount(args),
            "INCR" => self.cmd_incrby(args, "incr", Some(1)),
            "DECR" => self.cmd_incrby(args, "decr", Some(-1)),
            "INCRBY" => self.cmd_incrby(args, "incrby", None),
            "DECRBY" => self.cmd_decrby(args),
            "INCRBYFLOAT" => self.cmd_incrbyfloat(args),
            "MGET" => self.cmd_mget(args),
            "MSET" => self.cmd_mset(args),
            "MSETNX" => self.cmd_msetnx(args),

            // Key commands
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "EXPIRE" => self.cmd_expire(args, "expire", MILLIS_PER_SEC),
            "PEXPIRE" => self.cmd_expire(args, "pexpire", 1),
            "PERSIST" => self.cmd_persist(args),
            "TTL" => self.cmd_ttl(args, "ttl", |ms| ms.saturating_add(500) / 1000),
            "PTTL" => self.cmd_ttl(args, "pttl", |ms| ms),

            // Server commands
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),
            "DBSIZE" => self.cmd_dbsize(args),
            "FLUSHDB" | "FLUSHALL" => self.cmd_flushdb(args),

            _ => Err(CommandError::UnknownCommand(cmd.to_string())),
        }
    }

    // ========================================================================
    // String Commands
    // ========================================================================

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> CommandResult {
        let [key] = args else {
            return Err(arity("get"));
        };
        Ok(Reply::optional(self.store.get(key)))
    }

    /// SET key value [NX|XX] [EX seconds|PX milliseconds|KEEPTTL] [GET]
    fn cmd_set(&self, args: &[Bytes]) -> CommandResult {
        let [key, value, options @ ..] = args else {
            return Err(arity("set"));
        };
        let options = parse_set_options(options)?;

        let reply = self
            .store
            .set(key.clone(), value.clone(), options)
            .map_err(|e| expire_time_error(e, "set"))?;
        Ok(if options.get {
            Reply::optional(reply.previous)
        } else if reply.written {
            Reply::ok()
        } else {
            Reply::Nil
        })
    }

    /// SETNX key value
    fn cmd_setnx(&self, args: &[Bytes]) -> CommandResult {
        let [key, value] = args else {
            return Err(arity("setnx"));
        };
        let written = self.store.set_nx(key.clone(), value.clone());
        Ok(Reply::integer(written as i64))
    }

    /// SETEX key seconds value / PSETEX key milliseconds value
    fn cmd_setex(&self, args: &[Bytes], name: &str, millis_per_unit: u64) -> CommandResult {
        let [key, ttl, value] = args else {
            return Err(arity(name));
        };
        let ttl = parse_ttl(ttl, name, millis_per_unit)?;

        self.store
            .set_ex(key.clone(), value.clone(), ttl)
            .map_err(|e| expire_time_error(e, name))?;
        Ok(Reply::ok())
    }

    /// GETSET key value
    fn cmd_getset(&self, args: &[Bytes]) -> CommandResult {
        let [key, value] = args else {
            return Err(arity("getset"));
        };
        Ok(Reply::optional(self.store.get_set(key.clone(), value.clone())))
    }

    /// GETDEL key
    fn cmd_getdel(&self, args: &[Bytes]) -> CommandResult {
        let [key] = args else {
            return Err(arity("getdel"));
        };
        Ok(Reply::optional(self.store.get_del(key)))
    }

    /// APPEND key value
    fn cmd_append(&self, args: &[Bytes]) -> CommandResult {
        let [key, value] = args else {
            return Err(arity("append"));
        };
        let new_len = self.store.append(key, value)?;
        Ok(Reply::integer(new_len as i64))
    }

    /// STRLEN key
    fn cmd_strlen(&self, args: &[Bytes]) -> CommandResult {
        let [key] = args else {
            return Err(arity("strlen"));
        };
        Ok(Reply::integer(self.store.strlen(key) as i64))
    }

    /// GETRANGE key start end
    fn cmd_getrange(&self, args: &[Bytes]) -> CommandResult {
        let [key, start, end] = args else {
            return Err(arity("getrange"));
        };
        let (start, end) = (parse_int(start)?, parse_int(end)?);
        Ok(Reply::bulk(self.store.get_range(key, start, end)))
    }

    /// SETRANGE key offset value
    fn cmd_setrange(&self, args: &[Bytes]) -> CommandResult {
        let [key, offset, value] = args else {
            return Err(arity("setrange"));
        };
        let offset = parse_int(offset)?;
        let new_len = self.store.set_range(key, offset, value)?;
        Ok(Reply::integer(new_len as i64))
    }

    /// GETBIT key offset
    fn cmd_getbit(&self, args: &[Bytes]) -> CommandResult {
        let [key, offset] = args else {
            return Err(arity("getbit"));
        };
        let bit = self.store.get_bit(key, parse_bit_offset(offset)?)?;
        Ok(Reply::integer(bit as i64))
    }

    /// SETBIT key offset bit
    fn cmd_setbit(&self, args: &[Bytes]) -> CommandResult {
        let [key, offset, bit] = args else {
            return Err(arity("setbit"));
        };
        let offset = parse_bit_offset(offset)?;
        let bit = match numeric::parse_i64(bit) {
            Ok(0) => 0,
            Ok(1) => 1,
            _ => {
                return Err(StoreError::InvalidArgument(
                    "bit is not an integer or out of range".to_string(),
                )
                .into())
            }
        };

        let previous = self.store.set_bit(key, offset, bit)?;
        Ok(Reply::integer(previous as i64))
    }

    /// BITCOUNT key [start end]
    fn cmd_bitcount(&self, args: &[Bytes]) -> CommandResult {
        let (key, range) = match args {
            [key] => (key, None),
            [key, start, end] => (key, Some((parse_int(start)?, parse_int(end)?))),
            [_, _] | [_, _, _, ..] => return Err(CommandError::Syntax),
            [] => return Err(arity("bitcount")),
        };
        Ok(Reply::integer(self.store.bit_count(key, range) as i64))
    }

    /// INCR key / DECR key / INCRBY key increment
    ///
    /// `fixed` is the delta for INCR and DECR, which take no delta argument.
    fn cmd_incrby(&self, args: &[Bytes], name: &str, fixed: Option<i64>) -> CommandResult {
        let (key, delta) = match (fixed, args) {
            (Some(delta), [key]) => (key, delta),
            (None, [key, delta]) => (key, parse_int(delta)?),
            _ => return Err(arity(name)),
        };
        Ok(Reply::integer(self.store.incr_by(key, delta)?))
    }

    /// DECRBY key decrement
    fn cmd_decrby(&self, args: &[Bytes]) -> CommandResult {
        let [key, delta] = args else {
            return Err(arity("decrby"));
        };
        Ok(Reply::integer(self.store.decr_by(key, parse_int(delta)?)?))
    }

    /// INCRBYFLOAT key increment
    fn cmd_incrbyfloat(&self, args: &[Bytes]) -> CommandResult {
        let [key, delta] = args else {
            return Err(arity("incrbyfloat"));
        };
        let delta = numeric::parse_f64(delta).map_err(|_| CommandError::NotAFloat)?;
        let text = self.store.incr_by_float(key, delta)?;
        Ok(Reply::bulk(text))
    }

    /// MGET key [key ...]
    fn cmd_mget(&self, args: &[Bytes]) -> CommandResult {
        if args.is_empty() {
            return Err(arity("mget"));
        }
        let values = self.store.mget(args);
        Ok(Reply::Array(values.into_iter().map(Reply::optional).collect()))
    }

    /// MSET key value [key value ...]
    fn cmd_mset(&self, args: &[Bytes]) -> CommandResult {
        self.store.mset(pairs(args, "mset")?);
        Ok(Reply::ok())
    }

    /// MSETNX key value [key value ...]
    fn cmd_msetnx(&self, args: &[Bytes]) -> CommandResult {
        let written = self.store.msetnx(pairs(args, "msetnx")?);
        Ok(Reply::integer(written as i64))
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[Bytes]) -> CommandResult {
        if args.is_empty() {
            return Err(arity("del"));
        }
        Ok(Reply::integer(self.store.delete(args) as i64))
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[Bytes]) -> CommandResult {
        if args.is_empty() {
            return Err(arity("exists"));
        }
        Ok(Reply::integer(self.store.exists(args) as i64))
    }

    /// EXPIRE key seconds / PEXPIRE key milliseconds
    ///
    /// A zero or negative TTL deletes the key.
    fn cmd_expire(&self, args: &[Bytes], name: &str, millis_per_unit: u64) -> CommandResult {
        let [key, ttl] = args else {
            return Err(arity(name));
        };
        let ttl = if parse_int(ttl)? <= 0 {
            Duration::ZERO
        } else {
            parse_ttl(ttl, name, millis_per_unit)?
        };

        let existed = self
            .store
            .expire(key, ttl)
            .map_err(|e| expire_time_error(e, name))?;
        Ok(Reply::integer(existed as i64))
    }

    /// PERSIST key
    fn cmd_persist(&self, args: &[Bytes]) -> CommandResult {
        let [key] = args else {
            return Err(arity("persist"));
        };
        Ok(Reply::integer(self.store.persist(key) as i64))
    }

    /// TTL key / PTTL key
    ///
    /// `to_units` converts the remaining milliseconds.
    fn cmd_ttl(&self, args: &[Bytes], name: &str, to_units: fn(i64) -> i64) -> CommandResult {
        let [key] = args else {
            return Err(arity(name));
        };
        let ttl = match self.store.ttl(key) {
            TtlState::Missing => -2,
            TtlState::Persistent => -1,
            TtlState::Remaining(left) => {
                to_units(i64::try_from(left.as_millis()).unwrap_or(i64::MAX))
            }
        };
        Ok(Reply::integer(ttl))
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, args: &[Bytes]) -> CommandResult {
        match args {
            [] => Ok(Reply::pong()),
            [message] => Ok(Reply::bulk(message.clone())),
            _ => Err(arity("ping")),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, args: &[Bytes]) -> CommandResult {
        let [message] = args else {
            return Err(arity("echo"));
        };
        Ok(Reply::bulk(message.clone()))
    }

    /// DBSIZE
    fn cmd_dbsize(&self, args: &[Bytes]) -> CommandResult {
        if !args.is_empty() {
            return Err(arity("dbsize"));
        }
        Ok(Reply::integer(self.store.len() as i64))
    }

    /// FLUSHDB / FLUSHALL
    fn cmd_flushdb(&self, _args: &[Bytes]) -> CommandResult {
        self.store.flush();
        Ok(Reply::ok())
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Wrong-arity error for the named command.
fn arity(name: &str) -> CommandError {
    CommandError::WrongArity(name.to_string())
}

const MILLIS_PER_SEC: u64 = 1000;

/// Parses an integer argument.
fn parse_int(arg: &[u8]) -> Result<i64, CommandError> {
    numeric::parse_i64(arg).map_err(|_| CommandError::NotAnInteger)
}

/// Parses a bit offset for GETBIT/SETBIT.
fn parse_bit_offset(arg: &[u8]) -> Result<i64, CommandError> {
    numeric::parse_i64(arg).map_err(|_| {
        StoreError::invalid("bit offset is not an integer or out of range").into()
    })
}

/// Parses a strictly positive TTL given in units of `millis_per_unit` ms.
///
/// The TTL must fit in `i64` milliseconds.
fn parse_ttl(arg: &[u8], name: &str, millis_per_unit: u64) -> Result<Duration, CommandError> {
    let invalid = || CommandError::InvalidExpireTime(name.to_string());

    let ttl = u64::try_from(parse_int(arg)?).map_err(|_| invalid())?;
    match ttl.checked_mul(millis_per_unit) {
        Some(ms) if ms > 0 && ms <= i64::MAX as u64 => Ok(Duration::from_millis(ms)),
        _ => Err(invalid()),
    }
}

/// Reports a TTL the store refused as an invalid expire time of `name`.
fn expire_time_error(err: StoreError, name: &str) -> CommandError {
    match err {
        StoreError::InvalidArgument(_) => CommandError::InvalidExpireTime(name.to_string()),
        other => other.into(),
    }
}

/// Groups `key value [key value ...]` into pairs.
fn pairs(args: &[Bytes], name: &str) -> Result<Vec<(Bytes, Bytes)>, CommandError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(arity(name));
    }
    Ok(args
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Parses the trailing options of SET.
///
/// Conflicting options (NX with XX, more than one of EX/PX/KEEPTTL) are a
/// syntax error, as is a missing or unknown option.
fn parse_set_options(args: &[Bytes]) -> Result<SetOptions, CommandError> {
    let mut options = SetOptions::default();
    let mut rest = args.iter();

    while let Some(arg) = rest.next() {
        let opt = String::from_utf8_lossy(arg).to_ascii_uppercase();
        let has_expiry = options.ex.is_some() || options.px.is_some() || options.keep_ttl;

        match opt.as_str() {
            "NX" if !options.xx => options.nx = true,
            "XX" if !options.nx => options.xx = true,
            "GET" => options.get = true,
            "KEEPTTL" if !has_expiry => options.keep_ttl = true,
            "EX" | "PX" if !has_expiry => {
                let arg = rest.next().ok_or(CommandError::Syntax)?;
                if opt == "EX" {
                    options.ex = Some(parse_ttl(arg, "set", MILLIS_PER_SEC)?.as_secs());
                } else {
                    options.px = Some(parse_ttl(arg, "set", 1)?.as_millis() as u64);
                }
            }
            _ => return Err(CommandError::Syntax),
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(StringStore::new()))
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn run(handler: &CommandHandler, args: &[&str]) -> Reply {
        handler.execute(&make_command(args))
    }

    fn bulk(s: &str) -> Reply {
        Reply::bulk(s.to_string())
    }

    #[test]
    fn test_ping_echo() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["PING"]), Reply::pong());
        assert_eq!(run(&handler, &["ping", "hello"]), bulk("hello"));
        assert_eq!(run(&handler, &["ECHO", "hi"]), bulk("hi"));
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "key2", "hello"]), Reply::ok());
        assert_eq!(run(&handler, &["GET", "key2"]), bulk("hello"));
        assert_eq!(run(&handler, &["GET", "key22"]), Reply::Nil);
    }

    #[test]
    fn test_set_with_options() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SET", "k", "v", "XX"]), Reply::Nil);
        assert_eq!(run(&handler, &["SET", "k", "v", "NX", "EX", "100"]), Reply::ok());
        assert_eq!(run(&handler, &["SET", "k", "v2", "NX"]), Reply::Nil);
        assert_eq!(run(&handler, &["SET", "k", "v2", "xx", "get"]), bulk("v"));
        assert_eq!(run(&handler, &["GET", "k"]), bulk("v2"));

        // The XX write above cleared the expiry
        assert_eq!(run(&handler, &["TTL", "k"]), Reply::integer(-1));

        assert_eq!(run(&handler, &["SET", "k", "v3", "PX", "5000", "GET"]), bulk("v2"));
        assert_eq!(run(&handler, &["SET", "k", "v4", "KEEPTTL"]), Reply::ok());
        assert!(run(&handler, &["PTTL", "k"]).as_integer().unwrap() > 0);
    }

    #[test]
    fn test_set_option_errors() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["SET", "k", "v", "NX", "XX"]),
            Reply::error("ERR syntax error")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v", "EX", "10", "PX", "10"]),
            Reply::error("ERR syntax error")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v", "EX"]),
            Reply::error("ERR syntax error")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v", "BOGUS"]),
            Reply::error("ERR syntax error")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v", "EX", "0"]),
            Reply::error("ERR invalid expire time in 'set' command")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v", "EX", "ten"]),
            Reply::error("ERR value is not an integer or out of range")
        );
        assert_eq!(
            run(&handler, &["SET", "k"]),
            Reply::error("ERR wrong number of arguments for 'set' command")
        );
        assert_eq!(run(&handler, &["GET", "k"]), Reply::Nil);
    }

    #[test]
    fn test_ttl_too_large_is_invalid_expire_time() {
        let handler = create_handler();
        run(&handler, &["SET", "k", "v"]);

        assert_eq!(
            run(&handler, &["EXPIRE", "k", "10000000000000000"]),
            Reply::error("ERR invalid expire time in 'expire' command")
        );
        assert_eq!(
            run(&handler, &["EXPIRE", "k", "1392729177565071147"]),
            Reply::error("ERR invalid expire time in 'expire' command")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v2", "EX", "9223372036854775807"]),
            Reply::error("ERR invalid expire time in 'set' command")
        );
        assert_eq!(
            run(&handler, &["SET", "k", "v2", "PX", "-1"]),
            Reply::error("ERR invalid expire time in 'set' command")
        );
        assert_eq!(
            run(&handler, &["SETEX", "k", "10000000000000000", "v2"]),
            Reply::error("ERR invalid expire time in 'setex' command")
        );

        // Rejected TTLs leave the key alone
        assert_eq!(run(&handler, &["GET", "k"]), bulk("v"));
        assert_eq!(run(&handler, &["TTL", "k"]), Reply::integer(-1));
        assert_eq!(run(&handler, &["PTTL", "k"]), Reply::integer(-1));
    }

    #[test]
    fn test_ttl_reports_long_expiry_without_overflow() {
        let handler = create_handler();
        run(&handler, &["SET", "k", "v"]);

        // About 292 million years, the longest TTL in seconds that fits
        assert_eq!(
            run(&handler, &["EXPIRE", "k", "9223372036854775"]),
            Reply::integer(1)
        );
        let pttl = run(&handler, &["PTTL", "k"]).as_integer().unwrap();
        let ttl = run(&handler, &["TTL", "k"]).as_integer().unwrap();
        assert!(pttl > 9_223_372_036_000_000_000);
        assert!(ttl > 9_223_372_036_000_000 && ttl <= 9_223_372_036_854_775);
    }

    #[test]
    fn test_setnx_setex_psetex() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["SETNX", "k", "a"]), Reply::integer(1));
        assert_eq!(run(&handler, &["SETNX", "k", "b"]), Reply::integer(0));

        assert_eq!(run(&handler, &["SETEX", "s", "100", "v"]), Reply::ok());
        let ttl = run(&handler, &["TTL", "s"]).as_integer().unwrap();
        assert!(ttl > 0 && ttl <= 100);

        assert_eq!(run(&handler, &["PSETEX", "p", "100000", "v"]), Reply::ok());
        let pttl = run(&handler, &["PTTL", "p"]).as_integer().unwrap();
        assert!(pttl > 0 && pttl <= 100_000);

        assert_eq!(
            run(&handler, &["SETEX", "s", "-5", "v"]),
            Reply::error("ERR invalid expire time in 'setex' command")
        );
    }

    #[test]
    fn test_getset_getdel() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["GETSET", "k", "a"]), Reply::Nil);
        assert_eq!(run(&handler, &["GETSET", "k", "b"]), bulk("a"));
        assert_eq!(run(&handler, &["GETDEL", "k"]), bulk("b"));
        assert_eq!(run(&handler, &["GET", "k"]), Reply::Nil);
    }

    #[test]
    fn test_append_strlen() {
        let handler = create_handler();

        run(&handler, &["SET", "key2", "hello"]);
        assert_eq!(run(&handler, &["APPEND", "key2", "--world"]), Reply::integer(12));
        assert_eq!(run(&handler, &["GET", "key2"]), bulk("hello--world"));
        assert_eq!(run(&handler, &["STRLEN", "key2"]), Reply::integer(12));
        assert_eq!(run(&handler, &["STRLEN", "nope"]), Reply::integer(0));
    }

    #[test]
    fn test_getrange_setrange() {
        let handler = create_handler();

        run(&handler, &["SET", "key2", "hello--world"]);
        assert_eq!(run(&handler, &["GETRANGE", "key2", "2", "6"]), bulk("llo--"));
        assert_eq!(run(&handler, &["GETRANGE", "key2", "4", "999"]), bulk("o--world"));
        assert_eq!(run(&handler, &["GETRANGE", "key2", "-994", "7"]), bulk("hello--w"));

        assert_eq!(run(&handler, &["SETRANGE", "key2", "7", "Redis"]), Reply::integer(12));
        assert_eq!(run(&handler, &["GET", "key2"]), bulk("hello--Redis"));
        assert_eq!(
            run(&handler, &["SETRANGE", "key2", "-1", "x"]),
            Reply::error("ERR offset is out of range")
        );
    }

    #[test]
    fn test_bit_commands() {
        let handler = create_handler();

        run(&handler, &["SET", "key2", "hello--world"]);
        assert_eq!(run(&handler, &["GETBIT", "key2", "0"]), Reply::integer(0));
        assert_eq!(run(&handler, &["GETBIT", "key2", "1"]), Reply::integer(1));

        assert_eq!(run(&handler, &["SETBIT", "bits", "7", "1"]), Reply::integer(0));
        assert_eq!(run(&handler, &["SETBIT", "bits", "7", "0"]), Reply::integer(1));
        assert_eq!(
            run(&handler, &["SETBIT", "bits", "7", "2"]),
            Reply::error("ERR bit is not an integer or out of range")
        );

        assert_eq!(
            run(&handler, &["GETBIT", "key2", "one"]),
            Reply::error("ERR bit offset is not an integer or out of range")
        );
        assert_eq!(
            run(&handler, &["SETBIT", "bits", "-1", "1"]),
            Reply::error("ERR bit offset is not an integer or out of range")
        );
        assert_eq!(
            run(&handler, &["SETBIT", "bits", "1.5", "1"]),
            Reply::error("ERR bit offset is not an integer or out of range")
        );

        run(&handler, &["SET", "fb", "foobar"]);
        assert_eq!(run(&handler, &["BITCOUNT", "fb"]), Reply::integer(26));
        assert_eq!(run(&handler, &["BITCOUNT", "fb", "1", "1"]), Reply::integer(6));
        assert_eq!(
            run(&handler, &["BITCOUNT", "fb", "1"]),
            Reply::error("ERR syntax error")
        );
    }

    #[test]
    fn test_incr_decr() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["INCR", "counter"]), Reply::integer(1));
        assert_eq!(run(&handler, &["INCRBY", "counter", "10"]), Reply::integer(11));
        assert_eq!(run(&handler, &["DECR", "counter"]), Reply::integer(10));
        assert_eq!(run(&handler, &["DECRBY", "counter", "5"]), Reply::integer(5));
        assert_eq!(run(&handler, &["DECRBY", "counter", "-3"]), Reply::integer(8));

        run(&handler, &["SET", "text", "hello"]);
        assert_eq!(
            run(&handler, &["INCR", "text"]),
            Reply::error("ERR value is not an integer or out of range")
        );
        assert_eq!(
            run(&handler, &["INCRBY", "counter", "abc"]),
            Reply::error("ERR value is not an integer or out of range")
        );

        run(&handler, &["SET", "big", "9223372036854775807"]);
        assert_eq!(
            run(&handler, &["INCR", "big"]),
            Reply::error("ERR increment or decrement would overflow")
        );
        assert_eq!(
            run(&handler, &["INCR", "a", "b"]),
            Reply::error("ERR wrong number of arguments for 'incr' command")
        );
    }

    #[test]
    fn test_incrbyfloat() {
        let handler = create_handler();

        run(&handler, &["SET", "f", "10.50"]);
        assert_eq!(run(&handler, &["INCRBYFLOAT", "f", "0.1"]), bulk("10.6"));
        assert_eq!(run(&handler, &["INCRBYFLOAT", "f", "-5"]), bulk("5.6"));
        assert_eq!(run(&handler, &["INCRBYFLOAT", "g", "2.0e2"]), bulk("200"));
        assert_eq!(
            run(&handler, &["INCRBYFLOAT", "f", "x"]),
            Reply::error("ERR value is not a valid float")
        );
    }

    #[test]
    fn test_mset_mget_msetnx() {
        let handler = create_handler();

        assert_eq!(run(&handler, &["MSET", "a", "1", "b", "2"]), Reply::ok());
        assert_eq!(
            run(&handler, &["MGET", "a", "b", "c"]),
            Reply::Array(vec![bulk("1"), bulk("2"), Reply::Nil])
        );
        assert_eq!(
            run(&handler, &["MSET", "a", "1", "b"]),
            Reply::error("ERR wrong number of arguments for 'mset' command")
        );

        assert_eq!(run(&handler, &["MSETNX", "a", "9", "d", "4"]), Reply::integer(0));
        assert_eq!(run(&handler, &["GET", "d"]), Reply::Nil);
        assert_eq!(run(&handler, &["MSETNX", "d", "4", "e", "5"]), Reply::integer(1));
    }

    #[test]
    fn test_key_commands() {
        let handler = create_handler();

        run(&handler, &["MSET", "a", "1", "b", "2"]);
        assert_eq!(run(&handler, &["EXISTS", "a", "b", "zz"]), Reply::integer(2));
        assert_eq!(run(&handler, &["TTL", "a"]), Reply::integer(-1));
        assert_eq!(run(&handler, &["TTL", "zz"]), Reply::integer(-2));

        assert_eq!(run(&handler, &["EXPIRE", "a", "100"]), Reply::integer(1));
        assert_eq!(run(&handler, &["TTL", "a"]), Reply::integer(100));
        assert_eq!(run(&handler, &["PERSIST", "a"]), Reply::integer(1));
        assert_eq!(run(&handler, &["PERSIST", "a"]), Reply::integer(0));

        assert_eq!(run(&handler, &["PEXPIRE", "b", "-1"]), Reply::integer(1));
        assert_eq!(run(&handler, &["GET", "b"]), Reply::Nil);

        assert_eq!(run(&handler, &["DEL", "a", "b"]), Reply::integer(1));
        assert_eq!(run(&handler, &["DBSIZE"]), Reply::integer(0));
    }

    #[test]
    fn test_flushdb() {
        let handler = create_handler();

        run(&handler, &["MSET", "a", "1", "b", "2"]);
        assert_eq!(run(&handler, &["DBSIZE"]), Reply::integer(2));
        assert_eq!(run(&handler, &["FLUSHALL"]), Reply::ok());
        assert_eq!(run(&handler, &["DBSIZE"]), Reply::integer(0));
    }

    #[test]
    fn test_unknown_and_empty_command() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["FOOBAR"]),
            Reply::error("ERR unknown command 'FOOBAR'")
        );
        assert_eq!(handler.execute(&[]), Reply::error("ERR empty command"));
    }
}
