use anyhow::Context;
use chrono::prelude::*;

use moqt::coding::{Params, TrackNamespace};
use moqt::data;
use moqt::session::{Peer, SubscribeOptions};

pub struct Publisher {
    peer: Peer,
    namespace: TrackNamespace,
    track: String,
}

impl Publisher {
    pub fn new(peer: Peer, namespace: TrackNamespace, track: String) -> Self {
        Self {
            peer,
            namespace,
            track,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        log::info!(
            "publishing: namespace={} track={}",
            self.namespace.to_utf8_path(),
            self.track
        );

        self.peer
            .announce(self.namespace.clone(), Params::default())
            .context("failed to queue announce")?
            .response()
            .await
            .context("announce rejected")?;

        // One group per minute, one object per second.
        let start = Utc::now();
        let mut now = start;

        let alias = 1;
        let mut group_id = 0;

        loop {
            let mut stream = self
                .peer
                .open_subgroup(data::SubgroupHeader {
                    track_alias: alias,
                    group_id,
                    subgroup_id: 0,
                    publisher_priority: 127,
                })
                .await
                .context("failed to open subgroup")?;

            let base = now.format("%Y-%m-%d %H:%M:").to_string();
            stream
                .write_object(&data::ObjectHeader::new(0, base.into()))
                .await?;

            let mut object_id = 1;
            loop {
                let delta = now.second() as u64;
                stream
                    .write_object(&data::ObjectHeader::new(object_id, format!("{:02}", delta).into()))
                    .await?;
                object_id += 1;

                let next = (now + chrono::Duration::seconds(1))
                    .with_nanosecond(0)
                    .context("invalid time")?;

                let delay = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(delay).await;
                now = next;

                if next.second() == 0 {
                    break;
                }
            }

            stream.finish_group(object_id).await?;
            group_id += 1;
        }
    }
}

pub struct Subscriber {
    peer: Peer,
    namespace: TrackNamespace,
    track: String,
}

impl Subscriber {
    pub fn new(peer: Peer, namespace: TrackNamespace, track: String) -> Self {
        Self {
            peer,
            namespace,
            track,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut objects = self.peer.objects();

        let (_id, pending) = self
            .peer
            .subscribe(
                self.namespace.clone(),
                &self.track,
                SubscribeOptions::default(),
            )
            .context("failed to queue subscribe")?;

        let ok = pending.response().await.context("subscribe rejected")?;
        log::info!("subscribed: expires={}", ok.expires);

        while let Some(object) = objects.recv().await {
            let text = String::from_utf8_lossy(&object.payload);
            println!(
                "{}.{}.{}: {}",
                object.group_id,
                object.subgroup_id.unwrap_or(0),
                object.object_id,
                text
            );
        }

        anyhow::bail!("object stream ended");
    }
}
