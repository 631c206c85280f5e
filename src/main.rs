use std::process::ExitCode;

mod animation;
mod codec;
mod command;
mod config;
mod descriptor;
mod error;
mod thread;
mod workflow;

fn main() -> ExitCode {
    command::args_handle()
}
