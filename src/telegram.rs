//! [`TopicSource`] backed by a live grammers client.
//!
//! Forum topics are not covered by the high level client API, so everything here goes
//! through raw TL requests against the resolved channel.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use grammers_client::Client;
use grammers_tl_types as tl;
use tracing::{debug, info, warn};

use crate::archive::{Participant, Topic, TopicLookup, TopicMessage, TopicSource};
use crate::channel::ResolvedChannel;
use crate::config::PARTICIPANTS_PAGE_SIZE;
use crate::error::Result;

/// Search queries used for the aggressive participant sweep.
const SEARCH_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

pub struct GrammersSource<'a> {
    client: &'a Client,
    channel: ResolvedChannel,
    page_size: i32,
    aggressive: bool,
}

impl<'a> GrammersSource<'a> {
    pub fn new(client: &'a Client, channel: ResolvedChannel) -> Self {
        Self {
            client,
            channel,
            page_size: PARTICIPANTS_PAGE_SIZE,
            aggressive: true,
        }
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn aggressive(mut self, aggressive: bool) -> Self {
        self.aggressive = aggressive;
        self
    }

    /// Page through one participants filter, collecting users not seen yet.
    /// Returns the member count the server reported.
    async fn sweep(
        &self,
        filter: tl::enums::ChannelParticipantsFilter,
        seen: &mut HashSet<i64>,
        out: &mut Vec<Participant>,
    ) -> Result<i32> {
        let mut offset = 0;
        let mut reported = 0;

        loop {
            let request = tl::functions::channels::GetParticipants {
                channel: self.channel.input_channel.clone(),
                filter: filter.clone(),
                offset,
                limit: self.page_size,
                hash: 0,
            };

            let page = match self.client.invoke(&request).await? {
                tl::enums::channels::ChannelParticipants::Participants(page) => page,
                tl::enums::channels::ChannelParticipants::NotModified => break,
            };

            reported = page.count;
            let fetched = page.participants.len();
            // users also lists inviters and promoters who may not be members
            let members: HashSet<i64> = page
                .participants
                .iter()
                .filter_map(participant_user_id)
                .collect();
            for user in &page.users {
                if let Some(participant) = participant_from_user(user) {
                    if members.contains(&participant.id) && seen.insert(participant.id) {
                        out.push(participant);
                    }
                }
            }

            if fetched == 0 {
                break;
            }
            offset += fetched as i32;
            if offset >= page.count {
                break;
            }
        }

        Ok(reported)
    }
}

/// Map a raw user to a participant; empty users carry no name and are skipped.
pub fn participant_from_user(user: &tl::enums::User) -> Option<Participant> {
    match user {
        tl::enums::User::User(u) => Some(Participant {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            username: u.username.clone(),
        }),
        tl::enums::User::Empty(_) => None,
    }
}

/// User id of a channel member entry. Users who left, and non-user peers, yield `None`.
pub fn participant_user_id(participant: &tl::enums::ChannelParticipant) -> Option<i64> {
    match participant {
        tl::enums::ChannelParticipant::Participant(p) => Some(p.user_id),
        tl::enums::ChannelParticipant::ParticipantSelf(p) => Some(p.user_id),
        tl::enums::ChannelParticipant::Creator(p) => Some(p.user_id),
        tl::enums::ChannelParticipant::Admin(p) => Some(p.user_id),
        tl::enums::ChannelParticipant::Banned(p) if !p.left => match &p.peer {
            tl::enums::Peer::User(u) => Some(u.user_id),
            _ => None,
        },
        tl::enums::ChannelParticipant::Banned(_) | tl::enums::ChannelParticipant::Left(_) => None,
    }
}

/// Topic lookup request for a single id.
pub fn forum_topic_request(
    channel: &ResolvedChannel,
    topic_id: i32,
) -> tl::functions::messages::GetForumTopicsById {
    tl::functions::messages::GetForumTopicsById {
        peer: channel.input_peer.clone(),
        topics: vec![topic_id],
    }
}

fn peer_id(peer: &tl::enums::Peer) -> i64 {
    match peer {
        tl::enums::Peer::User(u) => u.user_id,
        tl::enums::Peer::Chat(c) => c.chat_id,
        tl::enums::Peer::Channel(c) => c.channel_id,
    }
}

fn unix_to_utc(date: i32) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(date), 0).unwrap_or_default()
}

/// Sender of a message. Posts without `from_id` are attributed to the peer they were sent in.
pub fn sender_id(from_id: Option<&tl::enums::Peer>, peer: &tl::enums::Peer) -> i64 {
    from_id.map_or_else(|| peer_id(peer), peer_id)
}

/// Whether a message carries media; `messageMediaEmpty` does not count.
pub fn has_media(media: Option<&tl::enums::MessageMedia>) -> bool {
    matches!(media, Some(media) if !matches!(media, tl::enums::MessageMedia::Empty))
}

pub fn topic_message_from_raw(message: &tl::enums::Message) -> TopicMessage {
    match message {
        tl::enums::Message::Message(m) => TopicMessage {
            id: m.id,
            date: unix_to_utc(m.date),
            sender_id: sender_id(m.from_id.as_ref(), &m.peer_id),
            text: Some(m.message.clone()),
            has_media: has_media(m.media.as_ref()),
        },
        tl::enums::Message::Service(s) => TopicMessage {
            id: s.id,
            date: unix_to_utc(s.date),
            sender_id: sender_id(s.from_id.as_ref(), &s.peer_id),
            text: None,
            has_media: false,
        },
        tl::enums::Message::Empty(e) => TopicMessage {
            id: e.id,
            date: DateTime::<Utc>::default(),
            sender_id: e.peer_id.as_ref().map_or(0, peer_id),
            text: None,
            has_media: false,
        },
    }
}

/// Map a raw forum topic; deleted topics have no title and are dropped.
pub fn topic_from_raw(topic: &tl::enums::ForumTopic) -> Option<Topic> {
    match topic {
        tl::enums::ForumTopic::Topic(t) => Some(Topic {
            id: t.id,
            title: t.title.clone(),
        }),
        tl::enums::ForumTopic::Deleted(_) => None,
    }
}

impl TopicSource for GrammersSource<'_> {
    async fn participants(&self) -> Result<Vec<Participant>> {
        let mut seen = HashSet::new();
        let mut participants = Vec::new();

        let reported = self
            .sweep(
                tl::enums::ChannelParticipantsFilter::ChannelParticipantsRecent,
                &mut seen,
                &mut participants,
            )
            .await?;
        debug!(reported, collected = participants.len(), "Recent participants sweep done");

        if self.aggressive && participants.len() < reported.max(0) as usize {
            info!(
                "Recent sweep returned {} of {} members, searching by prefix",
                participants.len(),
                reported
            );
            for letter in SEARCH_ALPHABET.chars() {
                let filter = tl::enums::ChannelParticipantsFilter::ChannelParticipantsSearch(
                    tl::types::ChannelParticipantsSearch {
                        q: letter.to_string(),
                    },
                );
                self.sweep(filter, &mut seen, &mut participants).await?;
            }
            if participants.len() < reported.max(0) as usize {
                warn!(
                    "Only {} of {} members could be listed; their messages show as deleted users",
                    participants.len(),
                    reported
                );
            }
        }

        Ok(participants)
    }

    async fn topic_by_id(&self, topic_id: i32) -> Result<TopicLookup> {
        let request = forum_topic_request(&self.channel, topic_id);

        let tl::enums::messages::ForumTopics::Topics(result) = self.client.invoke(&request).await?;

        Ok(TopicLookup {
            count: result.count,
            topics: result.topics.iter().filter_map(topic_from_raw).collect(),
        })
    }

    async fn history_page(
        &self,
        topic_id: i32,
        after_id: i32,
        limit: usize,
    ) -> Result<Vec<TopicMessage>> {
        let limit = limit as i32;
        // offset_id with a negative add_offset walks forward from after_id
        let request = tl::functions::messages::GetReplies {
            peer: self.channel.input_peer.clone(),
            msg_id: topic_id,
            offset_id: after_id + 1,
            offset_date: 0,
            add_offset: -limit,
            limit,
            max_id: 0,
            min_id: 0,
            hash: 0,
        };

        let raw = match self.client.invoke(&request).await? {
            tl::enums::messages::Messages::Messages(m) => m.messages,
            tl::enums::messages::Messages::Slice(m) => m.messages,
            tl::enums::messages::Messages::ChannelMessages(m) => m.messages,
            tl::enums::messages::Messages::NotModified(_) => Vec::new(),
        };

        let mut page: Vec<TopicMessage> = raw
            .iter()
            .map(topic_message_from_raw)
            .filter(|m| m.id > after_id)
            .collect();
        page.sort_by_key(|m| m.id);
        Ok(page)
    }
}
