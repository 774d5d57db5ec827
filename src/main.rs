use clap::Parser;
use dhcp4client::{Args, ClientConfig, DhcpClient, Lease, Link};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    // Read the hardware (MAC) address from the system.
    let link = Link::from_sysfs(&args.interface)?;
    tracing::info!(
        "Using interface '{}' with hardware address {:02x?}",
        link.name(),
        &link.hardware_addr()[..]
    );

    let config = ClientConfig::from_args(&args, link);
    tracing::info!(
        "Binding to port {} (timeout {:?}, retry {})",
        config.client_port,
        config.timeout,
        config.retry
    );
    let mut client = DhcpClient::new(config).await?;

    let ack = client.request().await?;
    tracing::info!(
        "State: {:?}, Lease: {:?}",
        client.state(),
        Lease::from_packet(&ack)
    );

    if args.renew {
        let renewed = client.renew(&ack).await?;
        tracing::info!(
            "State: {:?}, Renewed lease: {:?}",
            client.state(),
            Lease::from_packet(&renewed)
        );
    }

    Ok(())
}
