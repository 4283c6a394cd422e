//! Demonstration client: send one message, print the reply

use anyhow::{Context, Result};
use clap::Parser;

use eventlog::client::{send_tcp, send_udp};
use eventlog::config::DEFAULT_PORT;
use eventlog::utils::current_timestamp;

/// Send one message to an event log server and print the reply
#[derive(Parser, Debug)]
#[command(name = "eventlog-client", author, version, about, long_about = None)]
struct Args {
    /// Use UDP instead of TCP
    #[arg(short, long)]
    udp: bool,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Message to send; `{now}` is replaced with the current timestamp
    #[arg(short, long, default_value = "Hello World")]
    message: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let message = args.message.replace("{now}", &current_timestamp());
    let addr = (args.host.as_str(), args.port);

    let (transport, reply) = if args.udp {
        println!("UDP >>> {}", message);
        ("UDP", send_udp(addr, &message))
    } else {
        println!("TCP >>> {}", message);
        ("TCP", send_tcp(addr, &message))
    };

    let reply = reply.with_context(|| {
        format!("{} request to {}:{} failed", transport, args.host, args.port)
    })?;
    println!("{} <<< {}", transport, reply);
    Ok(())
}
