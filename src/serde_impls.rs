//! Serialization and Deserialization for syntax trees.
//!
//! A tree is written as the sequence of builder calls that reconstructs it. Annotations and
//! diagnostics are not part of the serialized form.

use std::{borrow::Cow, fmt, marker::PhantomData};

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Serialize,
};

use crate::{
    green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList},
    interning::TokenInterner,
    GreenNodeBuilder, Language, NodeOrToken, SyntaxNode,
};

#[derive(Deserialize, Serialize)]
#[serde(tag = "t", content = "c")]
enum Event<'text, K> {
    EnterNode(K),
    LeaveNode,
    EnterList,
    LeaveList,
    EmptySlot,
    Token(K, Cow<'text, str>, Option<Cow<'text, str>>),
    MissingToken(K),
    LeadingTrivia(K, Cow<'text, str>),
    TrailingTrivia(K, Cow<'text, str>),
    LeadingStructure(K, Vec<Event<'text, K>>),
    TrailingStructure(K, Vec<Event<'text, K>>),
}

fn node_events<'i, L: Language>(node: &GreenNode, interner: &'i TokenInterner, events: &mut Vec<Event<'i, L::Kind>>) {
    let list = node.is_list();
    events.push(if list {
        Event::EnterList
    } else {
        Event::EnterNode(L::kind_from_raw(node.kind()))
    });
    for slot in node.slots() {
        match slot {
            None => events.push(Event::EmptySlot),
            Some(NodeOrToken::Node(child)) => node_events::<L>(child, interner, events),
            Some(NodeOrToken::Token(token)) => token_events::<L>(token, interner, events),
        }
    }
    events.push(if list { Event::LeaveList } else { Event::LeaveNode });
}

fn token_events<'i, L: Language>(token: &GreenToken, interner: &'i TokenInterner, events: &mut Vec<Event<'i, L::Kind>>) {
    trivia_events::<L>(token.leading_trivia(), false, interner, events);
    let kind = L::kind_from_raw(token.kind());
    if token.is_missing() {
        events.push(Event::MissingToken(kind));
    } else {
        let value = token.value_key().map(|key| Cow::Borrowed(interner.resolve(key)));
        events.push(Event::Token(kind, Cow::Borrowed(token.text(interner)), value));
    }
    trivia_events::<L>(token.trailing_trivia(), true, interner, events);
}

fn trivia_events<'i, L: Language>(
    list: &GreenTriviaList,
    trailing: bool,
    interner: &'i TokenInterner,
    events: &mut Vec<Event<'i, L::Kind>>,
) {
    for trivia in list {
        let kind = L::kind_from_raw(trivia.kind());
        let event = match trivia.structure() {
            Some(structure) => {
                let mut nested = Vec::new();
                node_events::<L>(structure, interner, &mut nested);
                if trailing {
                    Event::TrailingStructure(kind, nested)
                } else {
                    Event::LeadingStructure(kind, nested)
                }
            }
            None => {
                let text = Cow::Borrowed(text_of(trivia, interner));
                if trailing {
                    Event::TrailingTrivia(kind, text)
                } else {
                    Event::LeadingTrivia(kind, text)
                }
            }
        };
        events.push(event);
    }
}

#[inline]
fn text_of<'i>(trivia: &GreenTrivia, interner: &'i TokenInterner) -> &'i str {
    trivia.text_key().map_or("", |key| interner.resolve(key))
}

/// Replays `events` into `builder`, rejecting sequences the builder would panic on.
fn replay<L: Language>(builder: &mut GreenNodeBuilder<'_, L>, events: Vec<Event<'_, L::Kind>>) -> Result<(), &'static str> {
    // `true` for open lists
    let mut open: Vec<bool> = Vec::new();
    let mut roots = 0;
    let mut after_token = false;
    let mut pending_leading = false;
    for event in events {
        let token_or_trailing = matches!(
            event,
            Event::Token(..) | Event::MissingToken(_) | Event::TrailingTrivia(..) | Event::TrailingStructure(..)
        );
        match event {
            Event::EnterNode(kind) => {
                if open.is_empty() {
                    if roots > 0 {
                        return Err("expected a single root node");
                    }
                    roots += 1;
                }
                open.push(false);
                builder.start_node(kind);
            }
            Event::LeaveNode | Event::LeaveList => {
                let list = matches!(event, Event::LeaveList);
                if open.pop() != Some(list) {
                    return Err("unbalanced node or list");
                }
                if pending_leading {
                    return Err("leading trivia must be followed by a token");
                }
                if list {
                    builder.finish_list();
                } else {
                    builder.finish_node();
                }
            }
            Event::EnterList => {
                if open.is_empty() {
                    return Err("lists must be inside a node");
                }
                open.push(true);
                builder.start_list();
            }
            Event::EmptySlot => {
                if open.last() != Some(&false) {
                    return Err("empty slots must be inside a node and outside of lists");
                }
                builder.empty_slot();
            }
            Event::Token(kind, text, value) => {
                if open.is_empty() {
                    return Err("tokens must be inside a node");
                }
                match value {
                    Some(value) => builder.token_with_value(kind, &text, &value),
                    None => builder.token(kind, &text),
                }
                pending_leading = false;
            }
            Event::MissingToken(kind) => {
                if open.is_empty() {
                    return Err("tokens must be inside a node");
                }
                builder.missing_token(kind);
                pending_leading = false;
            }
            Event::LeadingTrivia(kind, text) => {
                builder.leading_trivia(kind, &text);
                pending_leading = true;
            }
            Event::TrailingTrivia(kind, text) => {
                if !after_token {
                    return Err("trailing trivia must follow a token");
                }
                builder.trailing_trivia(kind, &text);
            }
            Event::LeadingStructure(kind, events) => {
                let structure = replay_structure(builder, events)?;
                builder.leading_structured_trivia(kind, structure);
                pending_leading = true;
            }
            Event::TrailingStructure(kind, events) => {
                if !after_token {
                    return Err("trailing trivia must follow a token");
                }
                let structure = replay_structure(builder, events)?;
                builder.trailing_structured_trivia(kind, structure);
            }
        }
        after_token = token_or_trailing;
    }
    if !open.is_empty() {
        return Err("unfinished node or list");
    }
    if pending_leading {
        return Err("leading trivia must be followed by a token");
    }
    if roots != 1 {
        return Err("expected a single root node");
    }
    Ok(())
}

/// Builds the structure of a trivia with a builder that shares the interner of `builder`.
fn replay_structure<L: Language>(
    builder: &mut GreenNodeBuilder<'_, L>,
    events: Vec<Event<'_, L::Kind>>,
) -> Result<GreenNode, &'static str> {
    let mut nested: GreenNodeBuilder<'_, L> = GreenNodeBuilder::with_cache(builder.cache_mut());
    replay(&mut nested, events)?;
    let (structure, _) = nested.finish();
    Ok(structure)
}

impl<L> Serialize for SyntaxNode<L>
where
    L: Language,
    L::Kind: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut events = Vec::new();
        node_events::<L>(self.green(), self.interner(), &mut events);
        serializer.collect_seq(events)
    }
}

impl<'de, L> Deserialize<'de> for SyntaxNode<L>
where
    L: Language,
    L::Kind: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct EventVisitor<L: Language> {
            _marker: PhantomData<fn() -> SyntaxNode<L>>,
        }

        impl<'de, L> Visitor<'de> for EventVisitor<L>
        where
            L: Language,
            L::Kind: Deserialize<'de>,
        {
            type Value = SyntaxNode<L>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of tree events")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut events = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(next) = seq.next_element::<Event<'_, L::Kind>>()? {
                    events.push(next);
                }

                let mut builder: GreenNodeBuilder<L> = GreenNodeBuilder::new();
                replay(&mut builder, events).map_err(de::Error::custom)?;
                let (tree, cache) = builder.finish();
                let interner = cache.map(|cache| cache.interner().clone()).unwrap_or_default();
                Ok(SyntaxNode::new_root(tree, interner))
            }
        }

        deserializer.deserialize_seq(EventVisitor { _marker: PhantomData })
    }
}
