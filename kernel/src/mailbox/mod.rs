// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, thread-addressed mailbox for inter-thread message passing.
//!
//! One [`Mailbox`] exists per receiving thread, registered in the kernel's
//! mailbox registry under that thread's id and torn down (after `clear`)
//! when the thread terminates.

mod slot;

pub use slot::{Mail, MailSlot, TEXT_SIZE};

use std::collections::VecDeque;

use crate::error::MailboxError;
use crate::klog;
use crate::sync::{InterruptController, Scheduler, Semaphore, ThreadId};

struct MailboxState {
    slots: Vec<MailSlot>,
    wait_read_list: VecDeque<ThreadId>,
}

/// A fixed-size array of mail slots, a semaphore gating writes, and a FIFO
/// wait list of readers blocked on an empty inbox.
pub struct Mailbox {
    owner: ThreadId,
    box_size: usize,
    state: InterruptController<MailboxState>,
    wait_write: Semaphore,
}

impl Mailbox {
    pub fn new(owner: ThreadId, box_size: usize) -> Self {
        Self {
            owner,
            box_size,
            state: InterruptController::new(MailboxState {
                slots: vec![MailSlot::empty(); box_size],
                wait_read_list: VecDeque::new(),
            }),
            wait_write: Semaphore::new(box_size),
        }
    }

    pub fn box_size(&self) -> usize {
        self.box_size
    }

    /// Current `waitWrite` permit count, for invariant checks in tests.
    pub fn wait_write_value(&self) -> usize {
        self.wait_write.value()
    }

    /// Count of non-empty slots, for invariant checks in tests.
    pub fn occupied_slots(&self) -> usize {
        self.state.raise().slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Length of the blocked-reader wait list, for invariant checks in tests.
    pub fn wait_read_list_len(&self) -> usize {
        self.state.raise().wait_read_list.len()
    }

    /// If the caller passes `size` of `None` or `Some(0)`, `msg` is treated
    /// as a zero-terminated string: the stored size is `min(strlen(msg) + 1,
    /// TEXT_SIZE)`, where "strlen" is the distance to the first `0` byte in
    /// `msg`, or all of `msg` if it has none (the terminator is then
    /// implicitly the zero byte one past the end, never actually present in
    /// `msg` -- `write_mail` relies on `text` starting zeroed to supply it).
    /// This count is never reduced by `msg.len()`: an empty string still
    /// costs one byte, for its terminator. Otherwise the stored size is
    /// `size`, clamped to `TEXT_SIZE` and to `msg.len()`.
    fn resolve_size(msg: &[u8], size: Option<usize>) -> usize {
        match size {
            Some(s) if s >= 1 => s.min(TEXT_SIZE).min(msg.len()),
            _ => {
                let str_len = msg.iter().position(|&b| b == 0).map_or(msg.len() + 1, |p| p + 1);
                str_len.min(TEXT_SIZE)
            }
        }
    }

    fn write_mail(&self, state: &mut MailboxState, slot: usize, sender: ThreadId, recipient: ThreadId, msg: &[u8], size: usize) {
        let mut text = [0u8; TEXT_SIZE];
        let copy_len = size.min(msg.len());
        text[..copy_len].copy_from_slice(&msg[..copy_len]);
        state.slots[slot] = MailSlot { sender_id: sender, receiver_id: recipient, size, text };
        klog!("wrote mail into slot {} for thread {:?}", slot, recipient);
    }

    fn read_mail(&self, state: &mut MailboxState, slot: usize) -> Mail {
        let entry = state.slots[slot];
        state.slots[slot] = MailSlot::empty();
        self.wait_write.v();
        Mail { sender_id: entry.sender_id, size: entry.size, text: entry.text }
    }

    /// Wakes the first thread in `wait_read_list` addressed to `id`, FIFO
    /// within that recipient. A no-op if none is waiting.
    fn awake_reader(&self, scheduler: &Scheduler, state: &mut MailboxState, id: ThreadId) {
        if let Some(pos) = state.wait_read_list.iter().position(|&t| t == id) {
            let reader = state.wait_read_list.remove(pos).expect("position just found");
            scheduler.ready_to_run(reader);
            klog!("woke reader {:?}", reader);
        }
    }

    /// Blocking send. Acquires one write permit before doing anything else,
    /// so the calling thread blocks here -- not inside the critical section
    /// below -- if the mailbox is currently full.
    pub fn send(&self, scheduler: &Scheduler, sender: ThreadId, recipient: ThreadId, msg: &[u8], size: Option<usize>) -> Result<(), MailboxError> {
        let size = Self::resolve_size(msg, size);
        self.wait_write.p();

        let mut state = self.state.raise();
        if !scheduler.is_valid(recipient) {
            drop(state);
            self.wait_write.v();
            return Err(MailboxError::InvalidRecipient);
        }

        match state.slots.iter().position(MailSlot::is_empty) {
            Some(slot) => {
                self.write_mail(&mut state, slot, sender, recipient, msg, size);
                self.awake_reader(scheduler, &mut state, recipient);
                Ok(())
            }
            None => {
                debug_assert!(false, "wait_write admitted a sender but no empty slot was found");
                drop(state);
                self.wait_write.v();
                Err(MailboxError::Corrupt)
            }
        }
    }

    /// Non-blocking send. Never touches the write-permit semaphore unless an
    /// empty slot is actually found.
    pub fn put(&self, scheduler: &Scheduler, sender: ThreadId, recipient: ThreadId, msg: &[u8], size: Option<usize>) -> Result<(), MailboxError> {
        let size = Self::resolve_size(msg, size);
        let mut state = self.state.raise();

        if !scheduler.is_valid(recipient) {
            return Err(MailboxError::InvalidRecipient);
        }

        match state.slots.iter().position(MailSlot::is_empty) {
            Some(slot) => {
                self.wait_write.p();
                self.write_mail(&mut state, slot, sender, recipient, msg, size);
                self.awake_reader(scheduler, &mut state, recipient);
                Ok(())
            }
            None => Err(MailboxError::Full),
        }
    }

    /// Blocking receive for this mailbox's owning thread. Rescans under the
    /// critical section before sleeping, so a thread with pending mail can
    /// never end up parked.
    pub fn get(&self, scheduler: &Scheduler) -> Mail {
        let mut state = self.state.raise();
        loop {
            if let Some(slot) = state.slots.iter().position(|s| !s.is_empty() && s.receiver_id == self.owner) {
                return self.read_mail(&mut state, slot);
            }
            state.wait_read_list.push_back(self.owner);
            scheduler.mark_asleep(self.owner);
            drop(state);
            scheduler.park(self.owner);
            state = self.state.raise();
        }
    }

    /// Non-blocking receive: one scan, no sleep.
    pub fn pick(&self) -> Option<Mail> {
        let mut state = self.state.raise();
        let slot = state.slots.iter().position(|s| !s.is_empty() && s.receiver_id == self.owner)?;
        Some(self.read_mail(&mut state, slot))
    }

    /// Empties every slot addressed to this mailbox's owner, releasing one
    /// write permit per slot cleared. Called at thread teardown so no
    /// producer stays blocked on a dead recipient's undelivered mail.
    pub fn clear(&self) {
        let mut state = self.state.raise();
        let owner = self.owner;
        for slot in state.slots.iter_mut() {
            if !slot.is_empty() && slot.receiver_id == owner {
                *slot = MailSlot::empty();
                self.wait_write.v();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Scheduler;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn scheduler_with(id: ThreadId) -> Scheduler {
        let sched = Scheduler::new();
        sched.register(id);
        sched
    }

    #[test]
    fn string_mode_includes_terminator() {
        let recipient = ThreadId(7);
        let sched = scheduler_with(recipient);
        let mbox = Mailbox::new(recipient, 2);

        mbox.send(&sched, ThreadId(1), recipient, b"hi\0", None).unwrap();
        let mail = mbox.pick().unwrap();
        assert_eq!(mail.size, 3);
        assert_eq!(&mail.text[..3], b"hi\0");
    }

    /// An empty string still costs one byte, for its terminator -- it must
    /// not be treated as a zero-byte message, which `MailSlot::is_empty`
    /// would mistake for no message at all and a permit would never be
    /// reclaimed for it.
    #[test]
    fn empty_string_mode_message_still_occupies_a_slot() {
        let recipient = ThreadId(7);
        let sched = scheduler_with(recipient);
        let mbox = Mailbox::new(recipient, 2);

        mbox.send(&sched, ThreadId(1), recipient, b"", None).unwrap();
        assert_eq!(mbox.occupied_slots(), 1);
        assert_eq!(mbox.wait_write_value(), 1);

        let mail = mbox.pick().unwrap();
        assert_eq!(mail.size, 1);
        assert_eq!(mail.text[0], 0);
        assert_eq!(mbox.wait_write_value(), 2);
    }

    #[test]
    fn put_fails_without_blocking_when_full() {
        let recipient = ThreadId(7);
        let sched = scheduler_with(recipient);
        let mbox = Mailbox::new(recipient, 2);

        mbox.put(&sched, ThreadId(1), recipient, b"a", Some(1)).unwrap();
        mbox.put(&sched, ThreadId(1), recipient, b"b", Some(1)).unwrap();
        assert_eq!(mbox.put(&sched, ThreadId(1), recipient, b"c", Some(1)), Err(MailboxError::Full));
        assert_eq!(mbox.wait_write_value(), 0);
    }

    #[test]
    fn send_blocks_until_receiver_drains() {
        let recipient = ThreadId(7);
        let sched = Arc::new(scheduler_with(recipient));
        let mbox = Arc::new(Mailbox::new(recipient, 1));

        mbox.put(&sched, ThreadId(1), recipient, b"a", Some(1)).unwrap();
        assert_eq!(mbox.wait_write_value(), 0);

        let (sender_sched, sender_mbox) = (Arc::clone(&sched), Arc::clone(&mbox));
        let handle = thread::spawn(move || {
            sender_mbox.send(&sender_sched, ThreadId(2), recipient, b"b", Some(1)).unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(mbox.wait_write_value(), 0);

        let mail = mbox.pick().unwrap();
        assert_eq!(&mail.text[..1], b"a");
        handle.join().unwrap();
        assert_eq!(mbox.occupied_slots(), 1);
    }

    #[test]
    fn clear_drains_mail_and_releases_permits() {
        let recipient = ThreadId(7);
        let sched = scheduler_with(recipient);
        let mbox = Mailbox::new(recipient, 2);

        mbox.put(&sched, ThreadId(1), recipient, b"a", Some(1)).unwrap();
        mbox.clear();
        assert_eq!(mbox.occupied_slots(), 0);
        assert_eq!(mbox.wait_write_value(), mbox.box_size());
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let recipient = ThreadId(7);
        let sched = Scheduler::new();
        let mbox = Mailbox::new(recipient, 2);

        assert_eq!(mbox.put(&sched, ThreadId(1), recipient, b"a", Some(1)), Err(MailboxError::InvalidRecipient));
        assert_eq!(mbox.wait_write_value(), 2);
    }
}
