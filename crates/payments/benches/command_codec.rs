use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use chrono::Utc;
use offchain_command::{JsonMode, PartyAddress, ProtocolCommand};
use offchain_payments::{PaymentAction, PaymentActor, PaymentCommand, PaymentObject, PaymentStatus};

fn payment_command(revision: i64) -> PaymentCommand {
    let first = PaymentObject::new(
        "ref-bench",
        0,
        PaymentActor::new("aaaa", PaymentStatus::None),
        PaymentActor::new("bbbb", PaymentStatus::None),
        PaymentAction::new(1_000, "LBT", "charge", Utc::now()).unwrap(),
    )
    .unwrap();
    let cmd = PaymentCommand::new(first.new_version(revision)).unwrap();
    cmd.set_origin(PartyAddress::from_encoded_str("vasp-bench").unwrap())
        .unwrap();
    cmd
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("payment_command_codec");
    let cmd = payment_command(1);

    for mode in [JsonMode::Net, JsonMode::Store] {
        group.bench_with_input(BenchmarkId::new("serialize", format!("{mode:?}")), &mode, |b, &mode| {
            b.iter(|| black_box(cmd.to_json_string(mode).unwrap()))
        });

        let text = cmd.to_json_string(mode).unwrap();
        group.bench_with_input(BenchmarkId::new("deserialize", format!("{mode:?}")), &mode, |b, &mode| {
            b.iter(|| black_box(PaymentCommand::from_json_str(&text, mode).unwrap()))
        });
    }

    group.bench_function("request_cid", |b| {
        b.iter(|| black_box(cmd.request_cid().unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
