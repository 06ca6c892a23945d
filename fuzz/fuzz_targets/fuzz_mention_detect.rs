#![no_main]
use libfuzzer_sys::fuzz_target;
use mention_router::mentions::{complete_mention, detect_mentions, mention_trigger};
use mention_router::personas::{Persona, Registry};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Treat the first line as an extra persona name, the rest as the message.
        let (name, text) = s.split_once('\n').unwrap_or(("Grammar Guru", s));
        let mut personas = vec![
            Persona::new("bot-1", "Grammar Guru"),
            Persona::new("bot-2", "Vocabulary Victor"),
        ];
        personas.push(Persona::new("fuzz", name));
        let registry = Registry::build(personas).unwrap_or_default();

        for m in detect_mentions(text, &registry) {
            assert!(text.is_char_boundary(m.span.start) && text.is_char_boundary(m.span.end));
            assert_eq!(&text[m.span.clone()], m.raw);
        }
        if mention_trigger(text).is_some() {
            let _ = complete_mention(text, "Grammar Guru");
        }
    }
});
