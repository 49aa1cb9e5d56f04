// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit kernel context: the one collaborator set the memory manager and
//! mailbox registry are reached through, instead of process-wide globals.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MailboxError, MemoryError};
use crate::mailbox::Mailbox;
use crate::memory::{MemoryConfig, MemoryManager, RandomAccessStore};
use crate::sync::{InterruptController, Scheduler, ThreadId};

/// Runtime configuration for a [`Kernel`], validated at construction time.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    pub page_size: usize,
    pub num_phys_pages: usize,
    pub mailbox_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { page_size: 128, num_phys_pages: 32, mailbox_size: 8 }
    }
}

/// Owns the scheduler, the memory manager, and a mailbox registry keyed by
/// thread id. Every operation in this crate takes a `&Kernel`/`&mut Kernel`
/// rather than reaching for process-wide state.
pub struct Kernel {
    pub scheduler: Scheduler,
    pub memory: InterruptController<MemoryManager>,
    mailboxes: InterruptController<HashMap<ThreadId, Arc<Mailbox>>>,
    mailbox_size: usize,
}

impl Kernel {
    pub fn new(config: KernelConfig, swap: Box<dyn RandomAccessStore>) -> Result<Self, MemoryError> {
        let memory = MemoryManager::new(
            MemoryConfig { page_size: config.page_size, num_phys_pages: config.num_phys_pages },
            swap,
        )?;
        Ok(Self {
            scheduler: Scheduler::new(),
            memory: InterruptController::new(memory),
            mailboxes: InterruptController::new(HashMap::new()),
            mailbox_size: config.mailbox_size,
        })
    }

    /// Registers a new live thread and gives it its own mailbox.
    pub fn spawn_thread(&self, id: ThreadId) {
        self.scheduler.register(id);
        self.mailboxes.raise().insert(id, Arc::new(Mailbox::new(id, self.mailbox_size)));
    }

    /// Drains the terminating thread's mailbox (releasing stuck senders)
    /// before retiring it from the scheduler and dropping its mailbox.
    pub fn terminate_thread(&self, id: ThreadId) {
        let mailbox = self.mailboxes.raise().remove(&id);
        if let Some(mailbox) = mailbox {
            mailbox.clear();
        }
        self.scheduler.retire(id);
    }

    fn mailbox_for(&self, recipient: ThreadId) -> Result<Arc<Mailbox>, MailboxError> {
        self.mailboxes.raise().get(&recipient).cloned().ok_or(MailboxError::InvalidRecipient)
    }

    pub fn send_mail(&self, sender: ThreadId, recipient: ThreadId, msg: &[u8], size: Option<usize>) -> Result<(), MailboxError> {
        self.mailbox_for(recipient)?.send(&self.scheduler, sender, recipient, msg, size)
    }

    pub fn put_mail(&self, sender: ThreadId, recipient: ThreadId, msg: &[u8], size: Option<usize>) -> Result<(), MailboxError> {
        self.mailbox_for(recipient)?.put(&self.scheduler, sender, recipient, msg, size)
    }

    pub fn get_mail(&self, recipient: ThreadId) -> crate::mailbox::Mail {
        self.mailbox_for(recipient)
            .expect("get_mail called for a thread with no mailbox")
            .get(&self.scheduler)
    }

    pub fn pick_mail(&self, recipient: ThreadId) -> Option<crate::mailbox::Mail> {
        self.mailbox_for(recipient).ok()?.pick()
    }

    /// Drains mail addressed to `id` without tearing down its mailbox.
    /// `terminate_thread` uses this internally; exposed separately for a
    /// thread that wants to discard stale mail without actually exiting.
    pub fn clear_mailbox(&self, id: ThreadId) {
        if let Some(mailbox) = self.mailboxes.raise().get(&id) {
            mailbox.clear();
        }
    }
}
