//! Serialized execution of relayouts and filter applications.
//!
//! Mutations of the graph are applied immediately, but the work that brings
//! the drawing up to date is queued as a [`Job`]. Jobs run one after another,
//! and a job only starts once every transition started by the previous one
//! has finished. A job reads the graph state when it runs, not when it was
//! queued, so a burst of mutations ends in one consistent drawing.

use crate::view::TransitionId;
use log::trace;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Recompute the layout and move everything into place
    Relayout,
    /// Recompute filtered children and visible dependencies, then relayout
    ApplyFilters,
    /// Announce that the relayout after an interactive fold has settled
    FoldFinished(String),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<Job>,
    relayout_queued: bool,
    filters_queued: bool,
    in_flight: Vec<TransitionId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a relayout unless one, or a filter application, is already waiting.
    ///
    /// Returns whether a job was queued.
    pub fn request_relayout(&mut self) -> bool {
        if self.relayout_queued || self.filters_queued {
            trace!("relayout already queued");
            return false;
        }
        self.relayout_queued = true;
        self.queue.push_back(Job::Relayout);
        true
    }

    /// Queue a relayout even if one is already waiting.
    pub fn force_relayout(&mut self) {
        self.relayout_queued = true;
        self.queue.push_back(Job::Relayout);
    }

    /// Queue a filter application unless one is already waiting.
    ///
    /// A filter application relayouts as well, so it takes the place of the
    /// first waiting relayout. Jobs queued behind that relayout keep waiting
    /// for it.
    pub fn request_apply_filters(&mut self) -> bool {
        if self.filters_queued {
            return false;
        }
        self.filters_queued = true;
        match self.queue.iter().position(|job| *job == Job::Relayout) {
            Some(index) => {
                trace!("filter application replaces queued relayout");
                self.queue[index] = Job::ApplyFilters;
                self.relayout_queued = self.queue.contains(&Job::Relayout);
            }
            None => self.queue.push_back(Job::ApplyFilters),
        }
        true
    }

    pub fn enqueue(&mut self, job: Job) {
        match job {
            Job::Relayout => self.force_relayout(),
            Job::ApplyFilters => {
                self.request_apply_filters();
            }
            other => self.queue.push_back(other),
        }
    }

    /// Remember transitions the running job started; the next job waits for them.
    pub fn track(&mut self, transitions: impl IntoIterator<Item = TransitionId>) {
        self.in_flight.extend(transitions);
    }

    /// The next job to run, if the transitions of the previous one have finished.
    pub fn next_job(&mut self, is_finished: impl Fn(TransitionId) -> bool) -> Option<Job> {
        self.in_flight.retain(|&t| !is_finished(t));
        if !self.in_flight.is_empty() {
            return None;
        }
        let job = self.queue.pop_front()?;
        match job {
            Job::Relayout => self.relayout_queued = self.queue.contains(&Job::Relayout),
            Job::ApplyFilters => self.filters_queued = false,
            Job::FoldFinished(_) => {}
        }
        trace!("running {:?}, {} jobs left", job, self.queue.len());
        Some(job)
    }

    /// A relayout or filter application is waiting to run
    pub fn has_pending_layout(&self) -> bool {
        self.relayout_queued || self.filters_queued
    }

    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// No job queued and no transition running
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    #[test]
    fn test_relayout_requests_collapse() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.request_relayout());
        assert!(!scheduler.request_relayout());
        assert_eq!(scheduler.pending_jobs(), 1);

        assert_eq!(scheduler.next_job(|_| true), Some(Job::Relayout));
        // a new request after the relayout started is queued again
        assert!(scheduler.request_relayout());
    }

    #[test]
    fn test_forced_relayout_is_always_queued() {
        let mut scheduler = Scheduler::new();
        scheduler.request_relayout();
        scheduler.force_relayout();
        assert_eq!(scheduler.pending_jobs(), 2);
    }

    #[test]
    fn test_jobs_wait_for_transitions() {
        let mut scheduler = Scheduler::new();
        scheduler.request_relayout();
        scheduler.enqueue(Job::FoldFinished("p".to_string()));

        assert_eq!(scheduler.next_job(|_| true), Some(Job::Relayout));
        scheduler.track([TransitionId(1), TransitionId(2)]);

        let finished = RefCell::new(HashSet::new());
        finished.borrow_mut().insert(TransitionId(1));
        assert_eq!(scheduler.next_job(|t| finished.borrow().contains(&t)), None);
        assert!(!scheduler.is_idle());

        finished.borrow_mut().insert(TransitionId(2));
        assert_eq!(
            scheduler.next_job(|t| finished.borrow().contains(&t)),
            Some(Job::FoldFinished("p".to_string()))
        );
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_filter_application_absorbs_relayout() {
        let mut scheduler = Scheduler::new();
        scheduler.request_relayout();
        scheduler.enqueue(Job::FoldFinished("p".to_string()));
        assert!(scheduler.request_apply_filters());
        assert_eq!(scheduler.pending_jobs(), 2);
        assert!(!scheduler.request_relayout());

        assert!(scheduler.has_pending_layout());
        assert_eq!(scheduler.next_job(|_| true), Some(Job::ApplyFilters));
        assert!(!scheduler.has_pending_layout());
        assert_eq!(scheduler.next_job(|_| true), Some(Job::FoldFinished("p".to_string())));
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_relayout_joins_queued_filter_application() {
        let mut scheduler = Scheduler::new();
        scheduler.request_apply_filters();
        assert!(!scheduler.request_relayout());
        scheduler.enqueue(Job::FoldFinished("p".to_string()));

        assert_eq!(scheduler.next_job(|_| true), Some(Job::ApplyFilters));
        // once the filters have been applied, relayouts are queued again
        assert!(scheduler.request_relayout());
    }

    #[test]
    fn test_filter_applications_collapse() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.request_apply_filters());
        assert!(!scheduler.request_apply_filters());
        assert_eq!(scheduler.next_job(|_| true), Some(Job::ApplyFilters));
        assert_eq!(scheduler.next_job(|_| true), None);
    }
}
