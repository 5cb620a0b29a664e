// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use crossing_core::{Acceleration, Distance, TimeDelta, TimePoint, Velocity};
use crossing_model::prelude::{
    IntersectionId, LaneId, Proposal, Request, RequestId, V2IMessage, VehicleSpec, Vin,
};
use crossing_policy::prelude::{
    FcfsRequestHandler, IntervalGridManager, Policy, PriorityConfig, PriorityRequestHandler,
    SimpleIntersection,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

const SEED: u64 = 0xC0_55ED;
const LANES: u32 = 4;
const BATCH: u32 = 64;
const PROPOSALS_PER_REQUEST: usize = 4;

fn intersection() -> SimpleIntersection {
    let mut im = SimpleIntersection::new(
        IntersectionId::new(0),
        (0..LANES).map(LaneId::new),
        IntervalGridManager::new(TimeDelta::new(1.5), TimeDelta::new(0.4)),
        Distance::new(60.0),
    );
    im.set_time(TimePoint::new(1.0));
    im
}

fn batch(rng: &mut ChaCha8Rng) -> Vec<V2IMessage> {
    let spec = VehicleSpec::new(Distance::new(4.5), Acceleration::new(-4.0)).unwrap();
    (0..BATCH)
        .map(|vin| {
            let from = rng.random_range(0..LANES);
            let to = (from + rng.random_range(1..LANES)) % LANES;
            let t0 = 1.0 + rng.random_range(0.5..6.0);
            let proposals = (0..PROPOSALS_PER_REQUEST)
                .map(|k| {
                    Proposal::new(
                        TimePoint::new(t0 + 0.5 * k as f64),
                        Velocity::new(rng.random_range(5.0..15.0)),
                        LaneId::new(from),
                        LaneId::new(to),
                        Velocity::new(6.0),
                    )
                })
                .collect();
            Request::new(Vin::new(vin), RequestId::new(0), proposals, spec)
                .unwrap()
                .into()
        })
        .collect()
}

fn bench_priority_flush(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let messages = batch(&mut rng);

    c.bench_function("priority_batch_flush_64", |b| {
        b.iter_batched(
            || {
                let handler =
                    PriorityRequestHandler::new(PriorityConfig::with_favored_lane(LaneId::new(1)));
                let mut policy = Policy::new(intersection(), handler);
                for m in messages.iter().cloned() {
                    policy.process_v2i_message(m).unwrap();
                }
                policy
            },
            |mut policy| black_box(policy.process_v2i_message_done().unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_fcfs_stream(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let messages = batch(&mut rng);

    c.bench_function("fcfs_stream_64", |b| {
        b.iter_batched(
            || (Policy::new(intersection(), FcfsRequestHandler::new()), messages.clone()),
            |(mut policy, messages)| {
                for m in messages {
                    black_box(policy.process_v2i_message(m).unwrap());
                }
                policy
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_priority_flush, bench_fcfs_stream);
criterion_main!(benches);
