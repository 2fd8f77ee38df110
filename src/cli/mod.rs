//! Command-line interface

pub mod commands;

pub use commands::{
    cmd_abandon, cmd_address, cmd_apply_tx, cmd_balance, cmd_decode_block, cmd_decode_stream,
    cmd_decode_tx, cmd_getblocks, cmd_init, cmd_send, CliResult,
};
