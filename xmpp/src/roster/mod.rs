// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The user's contact list, kept in sync with the server.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_xmpp::client::iq::IqRequest;
use tokio_xmpp::connect::Connection;
use tokio_xmpp::jid::{BareJid, Jid};
use tokio_xmpp::minidom::Element;
use tokio_xmpp::parsers::{
    iq::{Iq, IqType},
    ns,
    presence::{Presence, Type as PresenceType},
    private::{Query as PrivateQuery, RosterDelimiter},
    roster::{Item, Roster, Subscription},
    stanza_error::{DefinedCondition, ErrorType, StanzaError},
    stream_features::StreamFeatures,
};

mod cache;
mod contact;
mod group;

pub use cache::{cache_key, ByteCache, DirectoryCache, MemoryCache};
pub use contact::Contact;
pub use group::ContactGroup;
use group::{join_path, split_path, GroupTree};

use crate::event::RosterEvent;
use crate::subscription::{DefinedState, Direction, SubscriptionEvent};
use crate::Error;

const EVENT_CAPACITY: usize = 64;

/// How a [`RosterManager`] handles groups and caching.
#[derive(Clone, Default)]
pub struct RosterSettings {
    group_delimiter: Option<String>,
    discover_delimiter: bool,
    cache: Option<Arc<dyn ByteCache>>,
}

impl RosterSettings {
    /// Flat groups, no cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split group names on `delimiter` into nested groups.
    pub fn with_group_delimiter(mut self, delimiter: impl AsRef<str>) -> Self {
        self.group_delimiter = Some(delimiter.as_ref().into());
        self
    }

    /// Fetch the delimiter from private storage before each roster request.
    pub fn with_delimiter_discovery(mut self, discover: bool) -> Self {
        self.discover_delimiter = discover;
        self
    }

    /// Keep the roster in `cache`, to only get changes on the next
    /// connection when the server supports roster versioning.
    pub fn with_cache(mut self, cache: Arc<dyn ByteCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

#[derive(Default)]
struct RosterState {
    contacts: HashMap<BareJid, Contact>,
    groups: GroupTree,
    unaffiliated: HashSet<BareJid>,
    delimiter: Option<String>,
    versioning: bool,
}

fn validate_group_name(name: &str, delimiter: Option<&str>) -> Result<(), Error> {
    let contains_delimiter = delimiter.is_some_and(|d| !d.is_empty() && name.contains(d));
    if name.is_empty() || contains_delimiter {
        return Err(Error::InvalidGroupName(name.to_owned()));
    }
    Ok(())
}

/// The item to send in a roster set, without the server-controlled
/// attributes.
fn request_item(contact: &Contact) -> Item {
    Item {
        name: contact.name.clone(),
        groups: contact
            .groups
            .iter()
            .map(|group| tokio_xmpp::parsers::roster::Group(group.clone()))
            .collect(),
        ..Item::new(contact.jid.clone())
    }
}

/// Keeps the roster of the account bound on a [`Connection`].
///
/// Received elements must be handed to [`RosterManager::handle_element`] in
/// arrival order. Reconciliation happens under a single lock, and events are
/// broadcast after it is released.
pub struct RosterManager<C: Connection> {
    connection: Arc<C>,
    discover_delimiter: bool,
    cache: Option<Arc<dyn ByteCache>>,
    cache_writes: tokio::sync::Mutex<()>,
    state: Mutex<RosterState>,
    events: broadcast::Sender<RosterEvent>,
}

impl<C: Connection> RosterManager<C> {
    /// Create an empty roster for the account of `connection`.
    pub fn new(connection: Arc<C>, settings: RosterSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        RosterManager {
            connection,
            discover_delimiter: settings.discover_delimiter,
            cache: settings.cache,
            cache_writes: tokio::sync::Mutex::new(()),
            state: Mutex::new(RosterState {
                delimiter: settings.group_delimiter,
                ..RosterState::default()
            }),
            events,
        }
    }

    /// Receive every non-empty [`RosterEvent`] from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Whether the server supports roster versioning.
    pub fn set_roster_versioning(&self, supported: bool) {
        self.state.lock().versioning = supported;
    }

    /// Learn about roster versioning from the stream features.
    pub fn handle_features(&self, features: &StreamFeatures) {
        self.set_roster_versioning(features.can_roster_version());
    }

    /// The delimiter nested group names are split on.
    pub fn group_delimiter(&self) -> Option<String> {
        self.state.lock().delimiter.clone()
    }

    /// Fetch the roster from the server and replace the local one with it.
    ///
    /// With roster versioning and a cached roster, the server may answer
    /// with nothing, in which case the cached roster is used and the changes
    /// come as pushes.
    pub async fn request_roster(&self) -> Result<Roster, Error> {
        if self.discover_delimiter {
            match self.fetch_delimiter().await {
                Ok(Some(delimiter)) => self.state.lock().delimiter = Some(delimiter),
                Ok(None) => (),
                Err(e) => warn!("Failed to discover the roster group delimiter: {}", e),
            }
        }

        let versioning = self.state.lock().versioning;
        let cached = if versioning {
            self.load_cache().await
        } else {
            None
        };
        let request = Roster {
            ver: versioning.then(|| {
                cached
                    .as_ref()
                    .and_then(|roster| roster.ver.clone())
                    .unwrap_or_default()
            }),
            items: Vec::new(),
        };
        let roster = match self
            .connection
            .query(None, IqRequest::Get(request.into()))
            .await?
        {
            Some(payload) => Roster::try_from(payload)?,
            None => cached.unwrap_or_default(),
        };
        self.update(roster.clone(), false).await;
        Ok(roster)
    }

    async fn fetch_delimiter(&self) -> Result<Option<String>, Error> {
        let request = RosterDelimiter::default().into_query();
        let Some(payload) = self
            .connection
            .query(None, IqRequest::Get(request.into()))
            .await?
        else {
            return Ok(None);
        };
        let Some(stored) = PrivateQuery::try_from(payload)?.payload else {
            return Ok(None);
        };
        Ok(RosterDelimiter::try_from(stored)?.delimiter)
    }

    fn account_cache_key(&self) -> Option<String> {
        let account = self.connection.bound_jid()?;
        Some(cache_key(&account.to_bare()))
    }

    async fn load_cache(&self) -> Option<Roster> {
        let cache = self.cache.as_ref()?;
        let key = self.account_cache_key()?;
        let data = match cache.get(&key).await {
            Ok(data) => data?,
            Err(e) => {
                warn!("Failed to read the cached roster: {}", e);
                return None;
            }
        };
        let roster = std::str::from_utf8(&data)
            .ok()
            .and_then(|text| text.parse::<Element>().ok())
            .and_then(|elem| Roster::try_from(elem).ok());
        if roster.is_none() {
            warn!("Ignoring invalid cached roster");
        }
        roster
    }

    async fn store_cache(&self, roster: Roster) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), self.account_cache_key()) else {
            return;
        };
        let data = String::from(&Element::from(roster)).into_bytes();
        if let Err(e) = cache.put(&key, data).await {
            warn!("Failed to write the cached roster: {}", e);
        }
    }

    /// Apply a roster to the local state.
    ///
    /// A full roster replaces everything: contacts missing from it are
    /// reported as removed. A push only touches the contacts it carries.
    pub async fn update(&self, roster: Roster, is_push: bool) -> RosterEvent {
        let mut incoming: Vec<Contact> = roster.items.into_iter().map(Contact::from).collect();
        incoming.sort();

        // Snapshots reach the cache in the order they were taken.
        let _cache_write = match self.cache {
            Some(_) => Some(self.cache_writes.lock().await),
            None => None,
        };

        let (event, snapshot) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let mut previous = if is_push {
                None
            } else {
                state.groups.clear();
                state.unaffiliated.clear();
                Some(std::mem::take(&mut state.contacts))
            };
            let delimiter = state.delimiter.clone();
            let delimiter = delimiter.as_deref();
            let mut event = RosterEvent::default();

            for contact in incoming {
                let jid = contact.jid.clone();
                state.unaffiliated.remove(&jid);
                let old = match previous.as_mut() {
                    Some(previous) => previous.remove(&jid),
                    None => state.contacts.remove(&jid),
                };
                if contact.subscription == Subscription::Remove {
                    state.groups.remove_contact(&jid);
                    if let Some(old) = old {
                        event.removed.push(old);
                    }
                    continue;
                }
                state.groups.set_groups(&jid, &contact.groups, delimiter);
                if contact
                    .groups
                    .iter()
                    .all(|group| split_path(group, delimiter).is_empty())
                {
                    state.unaffiliated.insert(jid.clone());
                }
                match old {
                    Some(old) if old == contact => (),
                    Some(_) => event.updated.push(contact.clone()),
                    None => event.added.push(contact.clone()),
                }
                state.contacts.insert(jid, contact);
            }

            if let Some(previous) = previous {
                let mut gone: Vec<Contact> = previous.into_values().collect();
                gone.sort();
                event.removed.extend(gone);
            }

            let snapshot = roster.ver.filter(|ver| !ver.is_empty()).map(|ver| {
                let mut contacts: Vec<&Contact> = state.contacts.values().collect();
                contacts.sort();
                Roster {
                    ver: Some(ver),
                    items: contacts.into_iter().cloned().map(Item::from).collect(),
                }
            });
            (event, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.store_cache(snapshot).await;
        }
        debug!(
            "Roster {}: {} added, {} updated, {} removed",
            if is_push { "push" } else { "reset" },
            event.added.len(),
            event.updated.len(),
            event.removed.len()
        );
        if !event.is_empty() {
            // Nobody listening is fine.
            let _ = self.events.send(event.clone());
        }
        event
    }

    fn is_own_account(&self, from: Option<&Jid>) -> bool {
        let Some(from) = from else {
            return true;
        };
        match self.connection.bound_jid() {
            Some(own) => from.resource().is_none() && from.to_bare() == own.to_bare(),
            None => false,
        }
    }

    fn reply(&self, iq: Iq) {
        if let Err(e) = self.connection.send(iq.into()) {
            warn!("Failed to answer a roster push: {}", e);
        }
    }

    /// Handle a roster push.
    ///
    /// Pushes from anyone but the user's own account are answered with
    /// `service-unavailable` and dropped. Other IQs are handed back.
    pub async fn handle_iq(&self, iq: Iq) -> ControlFlow<(), Iq> {
        let payload = match &iq.payload {
            IqType::Set(payload) if payload.is("query", ns::ROSTER) => payload.clone(),
            _ => return ControlFlow::Continue(iq),
        };
        let reply_to = iq.from.clone();

        if !self.is_own_account(iq.from.as_ref()) {
            warn!(
                "Rejecting roster push from {}",
                iq.from.as_ref().map(|from| from.to_string()).unwrap_or_default()
            );
            let error = StanzaError::from_condition(
                ErrorType::Cancel,
                DefinedCondition::ServiceUnavailable,
            );
            self.reply(Iq {
                to: reply_to,
                ..Iq::from_error(iq.id, error)
            });
            return ControlFlow::Break(());
        }

        match Roster::try_from(payload) {
            Ok(roster) => {
                self.update(roster, true).await;
                self.reply(Iq::empty_result(reply_to, iq.id));
            }
            Err(e) => {
                warn!("Received invalid roster push: {}", e);
                let error =
                    StanzaError::from_condition(ErrorType::Modify, DefinedCondition::BadRequest);
                self.reply(Iq {
                    to: reply_to,
                    ..Iq::from_error(iq.id, error)
                });
            }
        }
        ControlFlow::Break(())
    }

    /// Handle an element received on the stream.
    ///
    /// Roster pushes are consumed. Stream features are inspected for roster
    /// versioning and handed back, like everything else.
    pub async fn handle_element(&self, element: Element) -> ControlFlow<(), Element> {
        if element.is("features", ns::STREAM) {
            match StreamFeatures::try_from(element.clone()) {
                Ok(features) => self.handle_features(&features),
                Err(e) => warn!("Received invalid stream features: {}", e),
            }
            return ControlFlow::Continue(element);
        }
        if !element.is("iq", ns::DEFAULT_NS) {
            return ControlFlow::Continue(element);
        }
        let Ok(iq) = Iq::try_from(element.clone()) else {
            return ControlFlow::Continue(element);
        };
        match self.handle_iq(iq).await {
            ControlFlow::Break(()) => ControlFlow::Break(()),
            ControlFlow::Continue(_) => ControlFlow::Continue(element),
        }
    }

    async fn set_item(&self, item: Item) -> Result<(), Error> {
        let roster = Roster {
            ver: None,
            items: vec![item],
        };
        self.connection
            .query(None, IqRequest::Set(roster.into()))
            .await?;
        Ok(())
    }

    /// Add a contact to the roster, and optionally ask for a subscription to
    /// its presence.
    ///
    /// The local roster only changes once the server pushes the new item.
    pub async fn add_contact(
        &self,
        contact: Contact,
        request_subscription: bool,
        status: Option<&str>,
    ) -> Result<(), Error> {
        self.set_item(request_item(&contact)).await?;
        if request_subscription {
            let mut presence = Presence::new(PresenceType::Subscribe).with_to(contact.jid);
            if let Some(status) = status {
                presence.set_status(status);
            }
            self.connection.send(presence.into())?;
        }
        Ok(())
    }

    /// Change the name or groups of a contact.
    pub async fn update_contact(&self, contact: Contact) -> Result<(), Error> {
        self.set_item(request_item(&contact)).await
    }

    /// Remove a contact from the roster, which also cancels subscriptions in
    /// both directions.
    pub async fn remove_contact(&self, jid: &BareJid) -> Result<(), Error> {
        self.set_item(Item {
            subscription: Subscription::Remove,
            ..Item::new(jid.clone())
        })
        .await
    }

    /// The contact with this address.
    pub fn contact(&self, jid: &BareJid) -> Option<Contact> {
        self.state.lock().contacts.get(jid).cloned()
    }

    /// All contacts, sorted.
    pub fn contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.state.lock().contacts.values().cloned().collect();
        contacts.sort();
        contacts
    }

    /// The top-level groups with everything below them.
    pub fn contact_groups(&self) -> Vec<ContactGroup> {
        let state = self.state.lock();
        state.groups.snapshot(&state.contacts)
    }

    /// Contacts which aren't in any group, sorted.
    pub fn unaffiliated_contacts(&self) -> Vec<Contact> {
        let state = self.state.lock();
        let mut contacts: Vec<Contact> = state
            .unaffiliated
            .iter()
            .filter_map(|jid| state.contacts.get(jid).cloned())
            .collect();
        contacts.sort();
        contacts
    }

    /// Contacts whose groups change when every group at or below
    /// `full_name` goes through `rewrite`, with their new group lists.
    fn regroup<F>(&self, full_name: &str, rewrite: F) -> Result<Vec<Contact>, Error>
    where
        F: Fn(&mut Vec<String>) -> Option<String>,
    {
        let state = self.state.lock();
        let delimiter = state.delimiter.as_deref();
        let depth = state
            .groups
            .depth(full_name)
            .ok_or_else(|| Error::GroupNotFound(full_name.to_owned()))?;
        let path = split_path(full_name, delimiter);

        let mut changed = Vec::new();
        for jid in state.groups.contacts_below(full_name) {
            let Some(contact) = state.contacts.get(&jid) else {
                continue;
            };
            let mut groups: Vec<String> = Vec::new();
            for group in &contact.groups {
                let mut segments = split_path(group, delimiter);
                let rewritten = if segments.len() > depth && segments[..=depth] == path[..] {
                    rewrite(&mut segments)
                } else {
                    Some(group.clone())
                };
                if let Some(rewritten) = rewritten {
                    if !groups.contains(&rewritten) {
                        groups.push(rewritten);
                    }
                }
            }
            if groups != contact.groups {
                changed.push(Contact {
                    groups,
                    ..contact.clone()
                });
            }
        }
        changed.sort();
        Ok(changed)
    }

    /// Rename a group, moving its subgroups along.
    ///
    /// Every contact whose groups change gets updated on the server.
    pub async fn rename_contact_group(&self, full_name: &str, new_name: &str) -> Result<(), Error> {
        let (delimiter, depth) = {
            let state = self.state.lock();
            let delimiter = state.delimiter.clone();
            validate_group_name(new_name, delimiter.as_deref())?;
            let depth = state.groups.depth(full_name);
            (delimiter, depth)
        };
        let depth = depth.ok_or_else(|| Error::GroupNotFound(full_name.to_owned()))?;
        let changed = self.regroup(full_name, |segments| {
            segments[depth] = new_name.to_owned();
            Some(join_path(segments, delimiter.as_deref()))
        })?;
        for contact in changed {
            self.set_item(request_item(&contact)).await?;
        }
        Ok(())
    }

    /// Remove a group and its subgroups, moving their contacts to the
    /// enclosing group, or out of any group for a top-level one.
    pub async fn remove_contact_group(&self, full_name: &str) -> Result<(), Error> {
        let parent = {
            let state = self.state.lock();
            if !state.groups.contains(full_name) {
                return Err(Error::GroupNotFound(full_name.to_owned()));
            }
            state.groups.parent(full_name).map(String::from)
        };
        let changed = self.regroup(full_name, |_| parent.clone())?;
        for contact in changed {
            self.set_item(request_item(&contact)).await?;
        }
        Ok(())
    }

    /// The state a contact would be in after a subscription presence,
    /// `None` for an unknown contact.
    pub fn predict_state(
        &self,
        jid: &BareJid,
        direction: Direction,
        event: SubscriptionEvent,
    ) -> Option<DefinedState> {
        let contact = self.contact(jid)?;
        // Incoming requests aren't part of roster items.
        let state = DefinedState::from_parts(contact.subscription, contact.pending_out, false)?;
        Some(state.transition(direction, event))
    }
}
