// IronClust parameter table

use crate::params::{ParamDefault, ParamSpec, ParamTable};

use ParamDefault::{Bool, Float, Int, Str};

const fn spec(name: &'static str, default: ParamDefault, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        default,
        description,
    }
}

const IRONCLUST_SPECS: &[ParamSpec] = &[
    spec("detect_sign", Int(-1), "Use -1, 0, or 1, depending on the sign of the spikes in the recording"),
    spec("adjacency_radius", Int(50), "Use -1 to include all channels in every neighborhood"),
    spec("adjacency_radius_out", Int(100), "Use -1 to include all channels in every neighborhood"),
    spec("detect_threshold", Float(3.5), "Detection threshold"),
    spec("prm_template_name", Str(""), ".prm template file name"),
    spec("freq_min", Int(300), "High-pass filter cutoff frequency"),
    spec("freq_max", Int(8000), "Low-pass filter cutoff frequency"),
    spec("merge_thresh", Float(0.985), "Threshold for automated merging"),
    spec("pc_per_chan", Int(9), "Number of principal components per channel"),
    spec("whiten", Bool(false), "Whether to do channel whitening as part of preprocessing"),
    spec("filter_type", Str("bandpass"), "none, bandpass, wiener, fftdiff, ndiff"),
    spec("filter_detect_type", Str("none"), "none, bandpass, wiener, fftdiff, ndiff"),
    spec("common_ref_type", Str("trimmean"), "none, mean, median"),
    spec("batch_sec_drift", Int(300), "Batch duration in seconds. clustering time duration"),
    spec("step_sec_drift", Int(20), "Compute anatomical similarity every n sec"),
    spec("knn", Int(30), "K nearest neighbors"),
    spec("min_count", Int(30), "Minimum cluster size"),
    spec("fGpu", Bool(true), "Use GPU if available"),
    spec("fft_thresh", Int(8), "FFT-based noise peak threshold"),
    spec("fft_thresh_low", Int(0), "FFT-based noise peak lower threshold (set to 0 to disable dual thresholding scheme)"),
    spec("nSites_whiten", Int(16), "Number of adjacent channels to whiten"),
    spec("feature_type", Str("gpca"), "gpca, pca, vpp, vmin, vminmax, cov, energy, xcov"),
    spec("delta_cut", Int(1), "Cluster detection threshold (delta-cutoff)"),
    spec("post_merge_mode", Int(1), "Post merge mode"),
    spec("sort_mode", Int(1), "Sort mode"),
    spec("fParfor", Bool(false), "Parfor loop"),
    spec("filter", Bool(true), "Enable or disable filter"),
    spec("clip_pre", Float(0.25), "Pre-peak clip duration in ms"),
    spec("clip_post", Float(0.75), "Post-peak clip duration in ms"),
    spec("merge_thresh_cc", Int(1), "Cross-correlogram merging threshold, set to 1 to disable"),
    spec("nRepeat_merge", Int(3), "Number of repeats for merge"),
    spec("merge_overlap_thresh", Float(0.95), "Knn-overlap merge threshold"),
];

pub static IRONCLUST_PARAMS: ParamTable = ParamTable::new(IRONCLUST_SPECS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_table_size_and_unique_names() {
        let specs = IRONCLUST_PARAMS.specs();
        assert_eq!(specs.len(), 32);

        let mut names: Vec<&str> = specs.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_defaults() {
        let defaults = IRONCLUST_PARAMS.defaults();
        assert_eq!(defaults.get("detect_sign"), Some(&ParamValue::Int(-1)));
        assert_eq!(defaults.get("fGpu"), Some(&ParamValue::Bool(true)));
        assert_eq!(
            defaults.get("prm_template_name"),
            Some(&ParamValue::Str(String::new()))
        );
        assert_eq!(
            IRONCLUST_PARAMS.description("knn"),
            Some("K nearest neighbors")
        );
    }
}
