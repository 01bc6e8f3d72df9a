use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

use memvol::mem::{Config, Volume};
use memvol::*;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

#[test]
fn concurrent_writers() {
    let fs = Volume::thread_safe();
    fs.mkdir("/shared", 0o755).unwrap();
    let shared = Arc::new(
        fs.open_file("/shared/log", OpenFlags::RDWR | OpenFlags::CREATE, 0o644)
            .unwrap(),
    );

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let fs = fs.clone();
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let dir = format!("/w{}", t);
                fs.mkdir(&dir, 0o755).unwrap();
                for round in 0..ROUNDS {
                    let path = format!("{}/{}", dir, round % 4);
                    fs.write_file(&path, &[t as u8; 16], 0o644).unwrap();
                    assert_eq!(fs.read_file(&path).unwrap(), [t as u8; 16]);

                    let slot = ((round * THREADS + t) * 4) as i64;
                    assert_eq!(shared.write_at(&[t as u8; 4], slot).unwrap(), 4);

                    fs.read_dir("/").unwrap();
                }
                fs.rename(&dir, format!("/done{}", t)).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let log = fs.read_file("/shared/log").unwrap();
    assert_eq!(log.len(), ROUNDS * THREADS * 4);
    for (i, chunk) in log.chunks(4).enumerate() {
        assert_eq!(chunk, [(i % THREADS) as u8; 4]);
    }
    for t in 0..THREADS {
        assert_eq!(fs.read_dir(format!("/done{}", t)).unwrap().len(), 4);
    }
}

#[test]
fn appenders_do_not_interleave_records() {
    let fs = Config::new().thread_safe(true).track_dirty(true).build();
    fs.write_file("/journal", b"", 0o644).unwrap();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let fs = fs.clone();
            thread::spawn(move || {
                let mut f = fs
                    .open_file("/journal", OpenFlags::WRONLY | OpenFlags::APPEND, 0)
                    .unwrap();
                for _ in 0..ROUNDS {
                    f.write_all(&[b'a' + t as u8; 8]).unwrap();
                }
                f.sync().unwrap();
                f.close().unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut data = Vec::new();
    fs.open("/journal").unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data.len(), THREADS * ROUNDS * 8);
    for record in data.chunks(8) {
        assert!(record.iter().all(|&b| b == record[0]));
    }
}
