//! Cross-thread behaviour of the single-slot channel.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use trafficlight::{Channel, Phase};

#[test]
fn one_send_releases_exactly_one_blocked_receiver() {
    let channel = Arc::new(Channel::<Phase>::new());
    let (results, delivered) = mpsc::channel();

    let receivers: Vec<_> = (0..2)
        .map(|_| {
            let channel = Arc::clone(&channel);
            let results = results.clone();
            thread::spawn(move || results.send(channel.receive()).unwrap())
        })
        .collect();

    // Both receivers are parked before anything is sent
    thread::sleep(Duration::from_millis(50));
    channel.send(Phase::Green);
    assert_eq!(
        delivered.recv_timeout(Duration::from_secs(2)).unwrap(),
        Phase::Green
    );

    // The other receiver stays blocked until a further send
    assert!(delivered.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(!channel.has_pending());

    channel.send(Phase::Red);
    assert_eq!(
        delivered.recv_timeout(Duration::from_secs(2)).unwrap(),
        Phase::Red
    );

    for handle in receivers {
        handle.join().unwrap();
    }
}

#[test]
fn unconsumed_value_is_overwritten() {
    let channel = Channel::new();
    channel.send(Phase::Green);
    channel.send(Phase::Red);
    assert_eq!(channel.receive(), Phase::Red);
    assert_eq!(channel.try_receive(), None);
}

#[test]
fn receiver_blocks_until_send() {
    let channel = Arc::new(Channel::<Phase>::new());
    let sender = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            channel.send(Phase::Green);
        })
    };

    assert_eq!(channel.receive(), Phase::Green);
    sender.join().unwrap();
}

#[test]
fn many_senders_one_receiver_sees_a_sent_value() {
    let channel = Arc::new(Channel::<u32>::new());
    let senders: Vec<_> = (0..4u32)
        .map(|i| {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.send(i))
        })
        .collect();
    for handle in senders {
        handle.join().unwrap();
    }

    let value = channel.receive();
    assert!(value < 4);
    assert!(!channel.has_pending());
}
