// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kernel::memory::InMemoryStore;
use kernel::sync::ThreadId;
use kernel::{Kernel, KernelConfig};

fn test_kernel(mailbox_size: usize) -> Arc<Kernel> {
    let config = KernelConfig { page_size: 64, num_phys_pages: 2, mailbox_size };
    let swap = Box::new(InMemoryStore::new(config.num_phys_pages * 2 * config.page_size));
    Arc::new(Kernel::new(config, swap).unwrap())
}

/// Scenario B1 -- blocking send/receive: a receiver already parked in `get`
/// must be woken with string-mode mail that includes its terminator.
#[test]
fn blocking_send_receive_string_mode() {
    let kernel = test_kernel(4);
    let sender = ThreadId(1);
    let recipient = ThreadId(7);
    kernel.spawn_thread(sender);
    kernel.spawn_thread(recipient);

    let reader = Arc::clone(&kernel);
    let handle = thread::spawn(move || reader.get_mail(recipient));

    thread::sleep(Duration::from_millis(50));
    kernel.send_mail(sender, recipient, b"hi\0", None).unwrap();

    let mail = handle.join().unwrap();
    assert_eq!(mail.size, 3);
    assert_eq!(&mail.text[..3], b"hi\0");
}

/// Scenario B2 -- full mailbox: a two-slot box accepts two non-blocking
/// puts, rejects a third, and a blocking send only completes once the
/// recipient drains a slot.
#[test]
fn full_mailbox_blocks_send_until_drained() {
    let kernel = test_kernel(2);
    let sender = ThreadId(1);
    let recipient = ThreadId(7);
    kernel.spawn_thread(sender);
    kernel.spawn_thread(recipient);

    kernel.put_mail(sender, recipient, b"a", Some(1)).unwrap();
    kernel.put_mail(sender, recipient, b"b", Some(1)).unwrap();
    assert!(kernel.put_mail(sender, recipient, b"c", Some(1)).is_err());

    let sender_side = Arc::clone(&kernel);
    let handle = thread::spawn(move || {
        sender_side.send_mail(sender, recipient, b"d", Some(1)).unwrap();
    });

    thread::sleep(Duration::from_millis(50));
    let first = kernel.get_mail(recipient);
    assert_eq!(&first.text[..1], b"a");

    handle.join().unwrap();
}

/// Scenario B3 -- termination drain: mail stuck waiting for a recipient
/// that clears its mailbox must release the blocked sender's permit, and
/// leave no trace addressed to that recipient.
#[test]
fn clearing_mailbox_unblocks_no_pending_mail_remains() {
    let kernel = test_kernel(1);
    let sender = ThreadId(1);
    let recipient = ThreadId(7);
    kernel.spawn_thread(sender);
    kernel.spawn_thread(recipient);

    kernel.send_mail(sender, recipient, b"m", Some(1)).unwrap();
    kernel.clear_mailbox(recipient);

    assert!(kernel.pick_mail(recipient).is_none());
    assert!(kernel.put_mail(sender, recipient, b"n", Some(1)).is_ok());
}
