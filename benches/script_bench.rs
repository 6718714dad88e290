// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sechat::script::{parse_program, tokenize};
use sechat::{ScriptExtractor, User, ROOM_USERS_TARGET};

fn room_script(users: usize) -> String {
    let records: Vec<String> = (0..users)
        .map(|i| {
            format!(
                r#"{{id: {}, name: "user {}", email_hash: "!abc{}", reputation: {}, last_post: 1700000000, is_moderator: {}}}"#,
                i + 1,
                i,
                i,
                i * 17,
                i % 10 == 0
            )
        })
        .collect();

    format!(
        r#"var roomId = 1;
        $(function () {{
            CHAT.Hub.init({{ roomId: 1, sound: false }});
            CHAT.RoomUsers.initPresent([{}]);
            if (window.x) {{ x(); }} else {{ y(); }}
        }});"#,
        records.join(",\n")
    )
}

fn room_page(users: usize) -> String {
    format!(
        r#"<html><head><script src="/chat.js"></script></head><body>
        <script>{}</script></body></html>"#,
        room_script(users)
    )
}

fn tokenize_benchmark(c: &mut Criterion) {
    let script = room_script(200);

    c.bench_function("tokenize_room_script", |b| {
        b.iter(|| black_box(tokenize(black_box(&script)).map(|t| t.len())))
    });
}

fn parse_benchmark(c: &mut Criterion) {
    let script = room_script(200);

    c.bench_function("parse_room_script", |b| {
        b.iter(|| black_box(parse_program(black_box(&script)).map(|p| p.len())))
    });
}

fn extract_benchmark(c: &mut Criterion) {
    let extractor = ScriptExtractor::new();
    let small = room_page(10);
    let large = room_page(500);

    c.bench_function("extract_users_10", |b| {
        b.iter(|| black_box(extractor.extract::<User>(black_box(&small), ROOM_USERS_TARGET)))
    });

    c.bench_function("extract_users_500", |b| {
        b.iter(|| black_box(extractor.extract::<User>(black_box(&large), ROOM_USERS_TARGET)))
    });
}

criterion_group!(benches, tokenize_benchmark, parse_benchmark, extract_benchmark);
criterion_main!(benches);
