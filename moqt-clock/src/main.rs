use std::net;

use anyhow::Context;
use clap::Parser;
use url::Url;

mod clock;

use moqt::coding::TrackNamespace;
use moqt::session::Session;
use moqt::setup::Role;
use moqt_native::quic;

#[derive(Parser, Clone)]
pub struct Cli {
    /// Listen for UDP packets on the given address.
    #[arg(long, default_value = "[::]:0")]
    pub bind: net::SocketAddr,

    /// Connect to the given URL starting with https://
    #[arg()]
    pub url: Url,

    /// The TLS configuration.
    #[command(flatten)]
    pub tls: moqt_native::tls::Args,

    /// Publish the current time, otherwise only subscribe.
    #[arg(long)]
    pub publish: bool,

    /// The namespace of the clock track.
    #[arg(long, default_value = "clock")]
    pub namespace: String,

    /// The name of the clock track.
    #[arg(long, default_value = "now")]
    pub track: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Cli::parse();
    let tls = config.tls.load()?;

    let quic = quic::Endpoint::new(quic::Config {
        bind: config.bind,
        tls,
    })?;

    log::info!("connecting to server: url={}", config.url);
    let session = quic.client.connect(&config.url).await?;

    let role = match config.publish {
        true => Role::Publisher,
        false => Role::Subscriber,
    };

    let (session, peer) = Session::connect(session, role, None)
        .await
        .context("failed to establish MoQ Transport session")?;

    let namespace = TrackNamespace::from_utf8_path(&config.namespace);

    if config.publish {
        let clock = clock::Publisher::new(peer, namespace, config.track);

        tokio::select! {
            res = session.run() => res.context("session error")?,
            res = clock.run() => res.context("clock error")?,
        }
    } else {
        let clock = clock::Subscriber::new(peer, namespace, config.track);

        tokio::select! {
            res = session.run() => res.context("session error")?,
            res = clock.run() => res.context("clock error")?,
        }
    }

    Ok(())
}
