//! Conduit throughput: producer thread writing through a bounded buffer

use std::io::{Read, Write};

fn main() {
    divan::main();
}

#[divan::bench(args = [64 * 1024, 1024 * 1024, 8 * 1024 * 1024])]
fn pipe_throughput(bencher: divan::Bencher, total: usize) {
    bencher.bench(|| {
        let (mut writer, mut reader) = arkline_core::conduit(256 * 1024);
        let payload = vec![0xA5u8; total];

        let producer = std::thread::spawn(move || {
            writer.write_all(&payload).unwrap();
        });

        let mut received = Vec::with_capacity(total);
        reader.read_to_end(&mut received).unwrap();
        producer.join().unwrap();
        received.len()
    });
}
