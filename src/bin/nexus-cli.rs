use std::net::{ToSocketAddrs, UdpSocket};

use clap::{Parser, Subcommand};

use rpc_nexus::config::schema::DEFAULT_UDP_PORT;
use rpc_nexus::nexus::{encode_datagram, AppTid};

#[derive(Parser)]
#[command(name = "nexus-cli")]
#[command(about = "Send control datagrams to an rpc-nexus process", long_about = None)]
struct Cli {
    /// Host running the Nexus.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Control-plane UDP port of the Nexus.
    #[arg(short, long, default_value_t = DEFAULT_UDP_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one control datagram to an endpoint thread
    Send {
        /// Destination endpoint thread id.
        #[arg(short, long)]
        tid: u8,

        /// Payload bytes (UTF-8).
        #[arg(long, default_value = "")]
        payload: String,

        /// Number of datagrams to send.
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Send a datagram without a routing header
    Garbage,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let target = (cli.host.as_str(), cli.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("could not resolve {}", cli.host))?;
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;

    match cli.command {
        Commands::Send { tid, payload, count } => {
            let datagram = encode_datagram(AppTid(tid), payload.as_bytes());
            for _ in 0..count {
                socket.send_to(&datagram, target)?;
            }
            println!("sent {} datagram(s) of {} bytes to thread {} at {}", count, datagram.len(), tid, target);
        }
        Commands::Garbage => {
            socket.send_to(&[0x00], target)?;
            println!("sent 1 malformed datagram to {}", target);
        }
    }

    Ok(())
}
