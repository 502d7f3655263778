use std::net::{Ipv4Addr, Ipv6Addr};
use std::process::ExitCode;

use clap::Parser;
use dnswire::client::{UdpClient, DEFAULT_RECV_BUFFER_SIZE};
use dnswire::{DnsError, Message, Name, RecordClass, RecordType, ResourceRecord};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dnswire")]
#[command(about = "Send one DNS query over UDP and print the decoded response")]
struct Cli {
    /// Domain name to look up
    name: String,

    /// Record type mnemonic (A, NS, CNAME, MX, TXT, AAAA, ...)
    #[arg(value_name = "TYPE", default_value = "A")]
    type_: RecordType,

    /// Server address as host:port
    #[arg(default_value = "8.8.8.8:53")]
    server: String,

    /// Record class mnemonic
    #[arg(short, long, default_value = "IN")]
    class: RecordClass,

    /// Clear the recursion desired flag
    #[arg(long)]
    no_recurse: bool,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_RECV_BUFFER_SIZE)]
    buffer_size: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match lookup(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn lookup(cli: &Cli) -> Result<(), DnsError> {
    let query = Message::query(&cli.name, cli.type_, cli.class, !cli.no_recurse)?;

    let client = UdpClient::new().with_recv_buffer_size(cli.buffer_size);
    let (response, raw) = client.send(&query, cli.server.as_str()).await?;

    println!(
        "id {} rcode {} authoritative {} truncated {}",
        response.header.id,
        response.header.flags.rcode(),
        response.header.flags.aa(),
        response.header.flags.tc()
    );

    for (section, records) in [
        ("answer", &response.answers),
        ("authority", &response.authorities),
        ("additional", &response.additionals),
    ] {
        for record in records {
            println!("{section}\t{}", format_record(record, &raw));
        }
    }

    Ok(())
}

fn format_record(record: &ResourceRecord, raw: &[u8]) -> String {
    let type_ = RecordType::from_int(record.type_)
        .map(|t| t.to_string())
        .unwrap_or_else(|| format!("TYPE{}", record.type_));
    let data = record.data();

    let value = match (RecordType::from_int(record.type_), data.len()) {
        (Some(RecordType::A), 4) => Ipv4Addr::new(data[0], data[1], data[2], data[3]).to_string(),
        (Some(RecordType::Aaaa), 16) => {
            let mut octets = [0; 16];
            octets.copy_from_slice(data);
            Ipv6Addr::from(octets).to_string()
        }
        (Some(RecordType::Ns | RecordType::Cname | RecordType::Ptr), _) => record
            .data_offset()
            .and_then(|offset| Name::decode_at(raw, offset).ok())
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| format!("{:02x?}", &data[..])),
        _ => format!("{:02x?}", &data[..]),
    };

    format!("{}\t{}\t{type_}\t{value}", record.name, record.ttl)
}
