// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Authenticates and fetches a roster against a scripted in-process server,
//! then prints the group tree.

use std::sync::Arc;

use tokio_xmpp::client::SaslNegotiator;
use tokio_xmpp::connect::ChannelConnection;
use xmpp::jid::Jid;
use xmpp::minidom::Element;
use xmpp::parsers::iq::{Iq, IqType};
use xmpp::roster::MemoryCache;
use xmpp::{ContactGroup, RosterManager, RosterSettings};

const ROSTER: &str = "<query xmlns='jabber:iq:roster' ver='1'>
    <item jid='romeo@example.net' name='Romeo' subscription='both'><group>Verona/Montague</group></item>
    <item jid='tybalt@example.net' name='Tybalt' subscription='none' ask='subscribe'><group>Verona/Capulet</group></item>
    <item jid='friar@example.net' name='Friar Laurence' subscription='to'/>
</query>";

fn print_group(group: &ContactGroup, indent: usize) {
    println!("{:indent$}{}/", "", group.name, indent = indent);
    for contact in &group.contacts {
        println!(
            "{:indent$}{} <{}>",
            "",
            contact.name.as_deref().unwrap_or(""),
            contact.jid,
            indent = indent + 2
        );
    }
    for subgroup in &group.groups {
        print_group(subgroup, indent + 2);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (connection, mut outgoing) = ChannelConnection::new("example.com");
    let connection = Arc::new(connection.with_bound_jid(Jid::new("juliet@example.com/balcony")?));
    let negotiator = Arc::new(SaslNegotiator::new(connection.clone()));
    let roster = RosterManager::new(
        connection.clone(),
        RosterSettings::new()
            .with_group_delimiter("/")
            .with_cache(Arc::new(MemoryCache::new())),
    );

    // The server side of the script.
    let server = tokio::spawn({
        let connection = connection.clone();
        let negotiator = negotiator.clone();
        async move {
            while let Some(element) = outgoing.recv().await {
                if element.name() == "auth" {
                    let success: Element =
                        "<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>".parse()?;
                    let _ = negotiator.handle_element(success);
                } else if let Ok(iq) = Iq::try_from(element) {
                    let payload = match iq.payload {
                        IqType::Get(_) => Some(ROSTER.parse::<Element>()?),
                        _ => None,
                    };
                    let response = Iq {
                        from: None,
                        to: None,
                        id: iq.id,
                        payload: IqType::Result(payload),
                    };
                    let _ = connection.handle_incoming(response.into());
                }
            }
            Ok::<(), xmpp::minidom::Error>(())
        }
    });

    negotiator.set_server_mechanisms(["PLAIN"]);
    negotiator.authenticate(None, "juliet", "r0m30").await?;
    roster.set_roster_versioning(true);
    roster.request_roster().await?;

    for group in roster.contact_groups() {
        print_group(&group, 0);
    }
    for contact in roster.unaffiliated_contacts() {
        println!("{} <{}>", contact.name.as_deref().unwrap_or(""), contact.jid);
    }

    server.abort();
    Ok(())
}
