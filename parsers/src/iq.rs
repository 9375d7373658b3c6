// Copyright (c) 2017 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2017 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;
use minidom::Element;
use xso::error::{Error, FromElementError};

use crate::ns;
use crate::stanza_error::StanzaError;

/// Should be implemented on every known payload of an `<iq type='get'/>`.
pub trait IqGetPayload: TryFrom<Element> + Into<Element> {}

/// Should be implemented on every known payload of an `<iq type='set'/>`.
pub trait IqSetPayload: TryFrom<Element> + Into<Element> {}

/// Should be implemented on every known payload of an `<iq type='result'/>`.
pub trait IqResultPayload: TryFrom<Element> + Into<Element> {}

/// Represents one of the four possible iq types.
#[derive(Debug, Clone, PartialEq)]
pub enum IqType {
    /// This is a request for accessing some data.
    Get(Element),

    /// This is a request for modifying some data.
    Set(Element),

    /// This is a result containing some data.
    Result(Option<Element>),

    /// A get or set request failed.
    Error(StanzaError),
}

impl IqType {
    fn as_str(&self) -> &'static str {
        match self {
            IqType::Get(_) => "get",
            IqType::Set(_) => "set",
            IqType::Result(_) => "result",
            IqType::Error(_) => "error",
        }
    }
}

/// The main structure representing the `<iq/>` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct Iq {
    /// The JID emitting this stanza.
    pub from: Option<Jid>,

    /// The recipient of this stanza.
    pub to: Option<Jid>,

    /// The @id attribute of this stanza, which is required in order to match
    /// a request with its result/error.
    pub id: String,

    /// The payload content of this stanza.
    pub payload: IqType,
}

impl Iq {
    /// Creates an `<iq/>` stanza containing a get request.
    pub fn from_get<S: Into<String>>(id: S, payload: impl IqGetPayload) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Get(payload.into()),
        }
    }

    /// Creates an `<iq/>` stanza containing a set request.
    pub fn from_set<S: Into<String>>(id: S, payload: impl IqSetPayload) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Set(payload.into()),
        }
    }

    /// Creates an empty `<iq type="result"/>` stanza.
    pub fn empty_result<S: Into<String>>(to: Option<Jid>, id: S) -> Iq {
        Iq {
            from: None,
            to,
            id: id.into(),
            payload: IqType::Result(None),
        }
    }

    /// Creates an `<iq/>` stanza containing a result.
    pub fn from_result<S: Into<String>>(id: S, payload: Option<impl IqResultPayload>) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Result(payload.map(Into::into)),
        }
    }

    /// Creates an `<iq/>` stanza containing an error.
    pub fn from_error<S: Into<String>>(id: S, payload: StanzaError) -> Iq {
        Iq {
            from: None,
            to: None,
            id: id.into(),
            payload: IqType::Error(payload),
        }
    }

    /// Sets the recipient of this stanza.
    pub fn with_to(mut self, to: Jid) -> Iq {
        self.to = Some(to);
        self
    }

    /// Sets the emitter of this stanza.
    pub fn with_from(mut self, from: Jid) -> Iq {
        self.from = Some(from);
        self
    }

    /// Sets the id of this stanza, in order to later match its response.
    pub fn with_id(mut self, id: String) -> Iq {
        self.id = id;
        self
    }
}

impl TryFrom<Element> for Iq {
    type Error = FromElementError;

    fn try_from(root: Element) -> Result<Iq, FromElementError> {
        check_self!(root, "iq", DEFAULT_NS);
        let from = get_attr!(root, "from", Option);
        let to = get_attr!(root, "to", Option);
        let id: String = get_attr!(root, "id", Required);
        let type_: String = get_attr!(root, "type", Required);

        let mut payload = None;
        let mut error_payload = None;
        for elem in root.children() {
            if payload.is_some() && type_ != "error" {
                return Err(Error::Other("Wrong number of children in iq element.").into());
            }
            if type_ == "error" {
                if elem.is("error", ns::DEFAULT_NS) {
                    if error_payload.is_some() {
                        return Err(Error::Other("Wrong number of children in iq element.").into());
                    }
                    error_payload = Some(StanzaError::try_from(elem.clone()).map_err(Error::from)?);
                }
                // The original request may be echoed back, it is ignored.
            } else {
                payload = Some(elem.clone());
            }
        }

        let type_ = match type_.as_str() {
            "get" => match payload {
                Some(payload) => IqType::Get(payload),
                None => return Err(Error::Other("Wrong number of children in iq element.").into()),
            },
            "set" => match payload {
                Some(payload) => IqType::Set(payload),
                None => return Err(Error::Other("Wrong number of children in iq element.").into()),
            },
            "result" => IqType::Result(payload),
            "error" => match error_payload {
                Some(payload) => IqType::Error(payload),
                None => return Err(Error::Other("Wrong number of children in iq element.").into()),
            },
            _ => return Err(Error::Other("Unknown iq type.").into()),
        };

        Ok(Iq {
            from,
            to,
            id,
            payload: type_,
        })
    }
}

impl From<Iq> for Element {
    fn from(iq: Iq) -> Element {
        let type_ = iq.payload.as_str();
        let builder = Element::builder("iq", ns::DEFAULT_NS)
            .attr("from", iq.from.map(|from| from.to_string()))
            .attr("to", iq.to.map(|to| to.to_string()))
            .attr("id", iq.id)
            .attr("type", type_);

        match iq.payload {
            IqType::Get(elem) | IqType::Set(elem) | IqType::Result(Some(elem)) => {
                builder.append(elem).build()
            }
            IqType::Error(error) => builder.append(Element::from(error)).build(),
            IqType::Result(None) => builder.build(),
        }
    }
}
