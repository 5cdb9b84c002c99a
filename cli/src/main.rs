mod output;
mod search;
mod server;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use simple_ssdp::SearchMatch;
use simple_ssdp::SsdpConfig;
use std::net::Ipv4Addr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { device, services } => {
            crate::server::serve(device.into_config(), services, cli.json).await?
        }
        Command::Search {
            device,
            target,
            timeout,
        } => crate::search::search(device.into_config(), &target, timeout, cli.json).await?,
    };
    Ok(())
}

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print events as JSON lines.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Announce a device and answer searches until interrupted.
    Serve {
        #[command(flatten)]
        device: DeviceArgs,

        /// Service URN to register, e.g. `urn:schemas-upnp-org:service:ContentDirectory:1`.
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Send one M-SEARCH and print the responses.
    Search {
        #[command(flatten)]
        device: DeviceArgs,

        #[arg(long, default_value = simple_ssdp::protocol::SEARCH_ALL)]
        target: String,

        /// Seconds to wait for responses.
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[derive(Args)]
struct DeviceArgs {
    #[arg(long, default_value = "SimpleSSDP")]
    device_name: String,

    /// Port of the description server and of unicast search responses.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    #[arg(long, default_value = "/description.xml")]
    location: String,

    #[arg(long, default_value = "simple-ssdp")]
    product: String,

    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    product_version: String,

    /// Address advertised in `LOCATION` instead of the detected one.
    #[arg(long)]
    host: Option<Ipv4Addr>,

    /// Only answer searches whose target matches an advertised type.
    #[arg(long)]
    exact_search: bool,

    #[arg(long)]
    no_multicast_loop: bool,
}

impl DeviceArgs {
    fn into_config(self) -> SsdpConfig {
        let search_match = if self.exact_search {
            SearchMatch::Exact
        } else {
            SearchMatch::EchoAll
        };
        let config = SsdpConfig::new(
            self.device_name,
            self.port,
            self.location,
            self.product,
            self.product_version,
        )
        .with_search_match(search_match)
        .with_multicast_loop(!self.no_multicast_loop);
        match self.host {
            Some(host) => config.with_host(host),
            None => config,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::parse_from([
            "simple-ssdp",
            "serve",
            "--device-name",
            "Printer",
            "--port",
            "9000",
            "--service",
            "urn:a",
            "--service",
            "urn:b",
            "--exact-search",
            "--json",
        ]);

        assert!(cli.json);
        let Command::Serve { device, services } = cli.command else {
            panic!("Expecting `serve`");
        };
        assert_eq!(services, ["urn:a", "urn:b"]);
        let config = device.into_config();
        assert_eq!(config.device_name, "Printer");
        assert_eq!(config.port, 9000);
        assert_eq!(config.search_match, SearchMatch::Exact);
        assert!(config.multicast_loop);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["simple-ssdp", "search", "--host", "10.0.0.1"]);

        let Command::Search {
            device,
            target,
            timeout,
        } = cli.command
        else {
            panic!("Expecting `search`");
        };
        assert_eq!(target, "ssdp:all");
        assert_eq!(timeout, 5);
        assert_eq!(device.into_config().host, Some(Ipv4Addr::new(10, 0, 0, 1)));
    }
}
