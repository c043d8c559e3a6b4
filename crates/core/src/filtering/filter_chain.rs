use crate::filtering::filter_operation::{FilterOperation, FilterStage};
use crate::filtering::filter_settings::FilterSettings;
use crate::shared::frame::Frame;

/// Ordered filters split around the gray conversion.
///
/// Insertion order is execution order. The same operation may be registered
/// more than once and then runs once per registration. There is no reorder
/// API: remove and add again to move a filter to the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterChain {
    pre_gray: Vec<FilterOperation>,
    post_gray: Vec<FilterOperation>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pre_filter(&mut self, op: FilterOperation) {
        self.pre_gray.push(op);
    }

    /// Removes the most recent registration of `op`. Returns `false` when it
    /// was not registered.
    pub fn remove_pre_filter(&mut self, op: FilterOperation) -> bool {
        remove_last(&mut self.pre_gray, op)
    }

    pub fn add_post_filter(&mut self, op: FilterOperation) {
        self.post_gray.push(op);
    }

    pub fn remove_post_filter(&mut self, op: FilterOperation) -> bool {
        remove_last(&mut self.post_gray, op)
    }

    /// Adds `op` to the stage it naturally belongs to.
    pub fn add(&mut self, op: FilterOperation) {
        match op.stage() {
            FilterStage::PreGray => self.add_pre_filter(op),
            FilterStage::PostGray => self.add_post_filter(op),
        }
    }

    pub fn remove(&mut self, op: FilterOperation) -> bool {
        match op.stage() {
            FilterStage::PreGray => self.remove_pre_filter(op),
            FilterStage::PostGray => self.remove_post_filter(op),
        }
    }

    pub fn run_pre(&self, frame: &mut Frame, settings: &FilterSettings) {
        for op in &self.pre_gray {
            op.apply(frame, settings);
        }
    }

    pub fn run_post(&self, frame: &mut Frame, settings: &FilterSettings) {
        for op in &self.post_gray {
            op.apply(frame, settings);
        }
    }

    pub fn pre_filters(&self) -> &[FilterOperation] {
        &self.pre_gray
    }

    pub fn post_filters(&self) -> &[FilterOperation] {
        &self.post_gray
    }

    /// Number of registered post-gray filters. Decides which branch the
    /// pipeline publishes as the final frame.
    pub fn post_filter_count(&self) -> usize {
        self.post_gray.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pre_gray.is_empty() && self.post_gray.is_empty()
    }
}

fn remove_last(ops: &mut Vec<FilterOperation>, op: FilterOperation) -> bool {
    match ops.iter().rposition(|&registered| registered == op) {
        Some(idx) => {
            ops.remove(idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_is_empty() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.post_filter_count(), 0);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(FilterOperation::Erode);
        chain.add_pre_filter(FilterOperation::GaussianBlur);
        chain.add_pre_filter(FilterOperation::Dilate);
        assert_eq!(
            chain.pre_filters(),
            &[
                FilterOperation::Erode,
                FilterOperation::GaussianBlur,
                FilterOperation::Dilate
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_runs_twice() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(FilterOperation::InvertRgb);
        chain.add_pre_filter(FilterOperation::InvertRgb);

        let mut frame = Frame::filled(2, 2, &[1, 2, 3]);
        chain.run_pre(&mut frame, &FilterSettings::default());

        // Two swaps cancel out.
        assert_eq!(frame, Frame::filled(2, 2, &[1, 2, 3]));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(FilterOperation::Erode);
        assert!(!chain.remove_pre_filter(FilterOperation::Dilate));
        assert!(!chain.remove_post_filter(FilterOperation::CannyEdge));
        assert_eq!(chain.pre_filters(), &[FilterOperation::Erode]);
    }

    #[test]
    fn test_remove_takes_latest_registration() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(FilterOperation::Erode);
        chain.add_pre_filter(FilterOperation::GaussianBlur);
        chain.add_pre_filter(FilterOperation::Erode);
        assert!(chain.remove_pre_filter(FilterOperation::Erode));
        assert_eq!(
            chain.pre_filters(),
            &[FilterOperation::Erode, FilterOperation::GaussianBlur]
        );
    }

    #[test]
    fn test_post_toggle_on_then_off_restores_count() {
        let mut chain = FilterChain::new();
        let before = chain.post_filter_count();

        chain.add_post_filter(FilterOperation::Threshold);
        assert_eq!(chain.post_filter_count(), before + 1);

        chain.remove_post_filter(FilterOperation::Threshold);
        assert_eq!(chain.post_filter_count(), before);
        assert!(chain.post_filters().is_empty());
    }

    #[test]
    fn test_add_routes_by_stage() {
        let mut chain = FilterChain::new();
        chain.add(FilterOperation::GaussianBlur);
        chain.add(FilterOperation::CannyEdge);
        assert_eq!(chain.pre_filters(), &[FilterOperation::GaussianBlur]);
        assert_eq!(chain.post_filters(), &[FilterOperation::CannyEdge]);
        assert!(chain.remove(FilterOperation::CannyEdge));
        assert_eq!(chain.post_filter_count(), 0);
    }

    #[test]
    fn test_run_post_reads_settings_each_call() {
        let mut chain = FilterChain::new();
        chain.add_post_filter(FilterOperation::Threshold);
        let mut settings = FilterSettings::default();

        settings.threshold_level = 100;
        let mut frame = Frame::filled(3, 3, &[150]);
        chain.run_post(&mut frame, &settings);
        assert!(frame.data().iter().all(|&v| v == 255));

        settings.threshold_level = 160;
        let mut frame = Frame::filled(3, 3, &[150]);
        chain.run_post(&mut frame, &settings);
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_pre_filters_run_in_order() {
        let mut chain = FilterChain::new();
        chain.add_pre_filter(FilterOperation::Erode);
        chain.add_pre_filter(FilterOperation::Dilate);

        let mut frame = Frame::filled(5, 5, &[0]);
        frame.data_mut()[12] = 255;
        chain.run_pre(&mut frame, &FilterSettings::default());
        // Erode wipes the dot before dilate can grow it.
        assert!(frame.data().iter().all(|&v| v == 0));
    }
}
