use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cf_compiler::{compile_filter_list, parse_filter_list, resolve_rules};

fn synthetic_list(lines: usize) -> String {
    let mut text = String::from("! Title: synthetic\n");
    for i in 0..lines {
        match i % 6 {
            0 => text.push_str(&format!("site{i}.com,~shop.site{i}.com##.ad-{i}\n")),
            1 => text.push_str(&format!("###banner-{i}\n")),
            2 => text.push_str(&format!("||ads{i}.example.net/*.js\n")),
            3 => text.push_str(&format!("||tracker{i}.example.net^\n")),
            4 => text.push_str(&format!("site{}.com#@#.ad-{}\n", i - 4, i - 4)),
            _ => text.push_str("/unsupported/*/pattern$third-party\n"),
        }
    }
    text
}

fn bench_compile(c: &mut Criterion) {
    let text = synthetic_list(30_000);

    c.bench_function("parse_filter_list", |b| {
        b.iter(|| parse_filter_list(black_box(&text)))
    });

    let parsed = parse_filter_list(&text);
    c.bench_function("resolve_rules", |b| {
        b.iter(|| resolve_rules(black_box(parsed.rules.clone()), black_box(&parsed.exceptions)))
    });

    c.bench_function("compile_filter_list", |b| {
        b.iter(|| compile_filter_list(black_box(&text)))
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
