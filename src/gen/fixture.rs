//! Generated from ASN.1 module `Event-Log`

pub mod event_log {
    use berium::{Decode, Encode, PrintableString, SetOf, Utf8String, tag::Context, tag::Implicit};

    /// ASN.1 `Level`: ENUMERATED
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
    #[repr(i64)]
    pub enum Level {
        Low = 0,
        Medium = 5,
        High = 6,
    }

    /// ASN.1 `Code`: INTEGER
    #[derive(Clone, Debug, PartialEq, Encode, Decode)]
    #[asn1(tag = "[APPLICATION 3] IMPLICIT")]
    pub struct Code(pub u8);

    /// ASN.1 `Tagged`: type reference
    #[derive(Clone, Debug, PartialEq, Encode, Decode)]
    #[asn1(tag = "[1] EXPLICIT")]
    pub struct Tagged(pub Code);

    /// ASN.1 `Event`: CHOICE
    #[derive(Clone, Debug, PartialEq, Encode, Decode)]
    pub enum Event {
        Code(Tagged),
        #[asn1(tag = "[0] IMPLICIT")]
        Note(Utf8String),
        Flag(bool),
    }

    /// ASN.1 `Entry`: SEQUENCE
    #[derive(Clone, Debug, PartialEq, Encode, Decode)]
    pub struct Entry {
        #[asn1(default = "entry_level_default")]
        pub level: Level,
        #[asn1(tag = "[2] IMPLICIT", default = "entry_label_default")]
        pub label: PrintableString,
        pub events: EntryEvents,
        #[asn1(tag = "[3] EXPLICIT")]
        pub next: Option<Box<Entry>>,
    }

    fn entry_level_default() -> Level {
        Level::Medium
    }

    fn entry_label_default() -> PrintableString {
        "none".parse().expect("literal checked against the character set")
    }

    /// ASN.1 `Entry.events`: SET OF
    pub type EntryEvents = SetOf<Event, 0, Implicit<Context, 1>>;
}
