//! Channel id normalisation and resolution from the account dialogs.

use grammers_client::types::peer::Peer;
use grammers_client::Client;
use grammers_tl_types as tl;
use tracing::debug;

use crate::error::{Error, Result};

/// A forum channel with the input handles needed for raw API calls.
#[derive(Debug, Clone)]
pub struct ResolvedChannel {
    pub id: i64,
    pub title: String,
    pub input_channel: tl::enums::InputChannel,
    pub input_peer: tl::enums::InputPeer,
}

impl ResolvedChannel {
    pub fn new(id: i64, access_hash: Option<i64>, title: &str) -> Self {
        let access_hash = access_hash.unwrap_or(0);
        Self {
            id,
            title: title.to_string(),
            input_channel: tl::enums::InputChannel::Channel(tl::types::InputChannel {
                channel_id: id,
                access_hash,
            }),
            input_peer: tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                channel_id: id,
                access_hash,
            }),
        }
    }
}

/// Strip the `-100` marker of Bot-API style channel ids.
///
/// `-1002244305221` and `2244305221` both map to `2244305221`.
pub fn normalize_channel_id(channel_id: i64) -> i64 {
    if channel_id >= 0 {
        return channel_id;
    }
    let text = channel_id.to_string();
    match text.strip_prefix("-100").map(str::parse::<i64>) {
        Some(Ok(id)) if id > 0 => id,
        _ => channel_id.saturating_abs(),
    }
}

/// Extract the channel handle from a dialog peer if it is a channel or megagroup.
fn channel_of(peer: &Peer) -> Option<ResolvedChannel> {
    match peer {
        Peer::Channel(channel) => Some(ResolvedChannel::new(
            channel.raw.id,
            channel.raw.access_hash,
            &channel.raw.title,
        )),
        Peer::Group(group) => match &group.raw {
            tl::enums::Chat::Channel(c) => Some(ResolvedChannel::new(c.id, c.access_hash, &c.title)),
            _ => None,
        },
        Peer::User(_) => None,
    }
}

/// Find the channel among the account dialogs.
pub async fn resolve_channel(client: &Client, channel_id: i64) -> Result<ResolvedChannel> {
    let target_id = normalize_channel_id(channel_id);
    let mut dialogs = client.iter_dialogs();

    while let Some(dialog) = dialogs
        .next()
        .await
        .map_err(|e| Error::TelegramError(e.to_string()))?
    {
        if let Some(channel) = channel_of(&dialog.peer) {
            if channel.id == target_id {
                debug!("Resolved channel {} '{}'", channel.id, channel.title);
                return Ok(channel);
            }
        }
    }

    Err(Error::ChannelNotFound(channel_id))
}
