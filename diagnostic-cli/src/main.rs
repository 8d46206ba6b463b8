mod air;
mod args;
mod decode;
mod encode;
mod hex;
mod loopback;
mod parse_record;

use clap::{Parser, Subcommand};

/// Tool to build, inspect and exercise temperature beacon advertisements.
#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a value and show the payload and advertisement it produces
    Encode(encode::Cli),

    /// Decode a payload given as hex
    Decode(decode::Cli),

    /// Parse a raw scan record given as hex and extract the reading from it
    ParseRecord(parse_record::Cli),

    /// Advertise a series of values to an in-process scanner
    Loopback(loopback::Cli),
}

#[allow(async_fn_in_trait)]
trait Runner {
    async fn run(&self) -> Result<(), ()>;
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Encode(args) => args.run().await,
        Command::Decode(args) => args.run().await,
        Command::ParseRecord(args) => args.run().await,
        Command::Loopback(args) => args.run().await,
    };

    if result.is_err() {
        ::std::process::exit(1);
    }
}

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    env_logger::init();
}
