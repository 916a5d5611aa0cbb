//! Measurement orchestrator — the polling loop of one scale.
//!
//! Each cycle reloads the profile snapshot, scans for a bounded window and
//! runs every captured frame through the device session. A fresh weigh-in is
//! attributed to a profile, turned into metrics and handed to storage.
//! Nothing inside the pipeline stops the loop; only scan or storage failures
//! and the shutdown signal do.

use std::collections::{BTreeMap, HashMap};

use bodyscale_domain::attribution::{self, Attribution};
use bodyscale_domain::composition::{self, BodyParameters};
use bodyscale_domain::error::ScaleError;
use bodyscale_domain::frame::RawFrame;
use bodyscale_domain::measurement::ValidatedMeasurement;
use bodyscale_domain::metrics::MetricsRecord;
use bodyscale_domain::profile::UserProfile;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::PipelineConfig;
use crate::ports::{FrameSource, MeasurementRepository, ProfileRepository};
use crate::session::{DeviceSession, SessionOutcome};

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Not from the monitored device, not a scale advertisement, or the
    /// weigh-in is still in progress.
    Skipped(&'static str),
    /// The completed weigh-in was rejected as implausible.
    Implausible(&'static str),
    Duplicate,
    Recorded(Box<MetricsRecord>),
}

impl FrameOutcome {
    /// Stable reason tag used in logs and cycle reports.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Skipped(reason) | Self::Implausible(reason) => reason,
            Self::Duplicate => "duplicate",
            Self::Recorded(_) => "recorded",
        }
    }
}

/// Summary of one processed batch of frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub frames: usize,
    /// Frame count per reason tag.
    pub reasons: BTreeMap<&'static str, usize>,
    /// Records handed to storage, in order.
    pub recorded: Vec<MetricsRecord>,
}

impl CycleReport {
    /// Number of frames that ended with `reason`.
    #[must_use]
    pub fn count(&self, reason: &str) -> usize {
        self.reasons.get(reason).copied().unwrap_or(0)
    }

    fn add(&mut self, outcome: FrameOutcome) {
        self.frames += 1;
        *self.reasons.entry(outcome.reason()).or_default() += 1;
        if let FrameOutcome::Recorded(record) = outcome {
            if record.is_unassigned() {
                *self.reasons.entry("unknown_user").or_default() += 1;
            }
            self.recorded.push(*record);
        }
    }
}

/// Drives the pipeline for one device.
pub struct MeasurementOrchestrator<S, P, M> {
    source: S,
    profiles: P,
    measurements: M,
    config: PipelineConfig,
    session: DeviceSession,
}

impl<S, P, M> MeasurementOrchestrator<S, P, M>
where
    S: FrameSource,
    P: ProfileRepository,
    M: MeasurementRepository,
{
    /// Create an orchestrator with an empty session.
    pub fn new(source: S, profiles: P, measurements: M, config: PipelineConfig) -> Self {
        let session = DeviceSession::new(config.device, config.tolerance);
        Self {
            source,
            profiles,
            measurements,
            config,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Seed the duplicate reference from the latest stored record, so a
    /// restart during an ongoing broadcast does not record the weigh-in again.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self), fields(mac = %self.config.device))]
    pub async fn restore_session(&mut self) -> Result<(), ScaleError> {
        let Some(latest) = self.measurements.latest().await? else {
            tracing::debug!("no stored measurement to restore");
            return Ok(());
        };
        match ValidatedMeasurement::new(latest.weight, latest.impedance, latest.timestamp) {
            Ok(measurement) => {
                tracing::info!(
                    weight_kg = latest.weight,
                    impedance_ohm = latest.impedance,
                    "restored last accepted measurement"
                );
                self.session.remember(measurement);
            }
            Err(error) => {
                tracing::warn!(%error, "latest stored measurement is not a valid reference");
            }
        }
        Ok(())
    }

    /// Reload profiles, scan once and process the captured frames.
    ///
    /// # Errors
    ///
    /// Returns scan, profile-store or storage errors; pipeline rejections are
    /// reported in the [`CycleReport`] instead.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, ScaleError> {
        let profiles = self.load_profiles().await?;
        let frames = self.source.scan(self.config.scan_window).await?;
        self.process_frames(&frames, &profiles).await
    }

    /// Run cycles until `shutdown` turns `true` or its sender is dropped.
    ///
    /// The signal is checked between cycles, during the scan wait and during
    /// the inter-cycle sleep.
    ///
    /// # Errors
    ///
    /// Returns the first scan, profile-store or storage error.
    #[tracing::instrument(skip_all, fields(mac = %self.config.device))]
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ScaleError> {
        tracing::info!(
            scan_window = ?self.config.scan_window,
            cycle_period = ?self.config.cycle_period,
            "measurement loop started"
        );
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            let started = Instant::now();

            let profiles = self.load_profiles().await?;
            let frames = tokio::select! {
                biased;
                frames = self.source.scan(self.config.scan_window) => frames?,
                _ = shutdown.changed() => break,
            };
            let report = self.process_frames(&frames, &profiles).await?;
            tracing::info!(
                frames = report.frames,
                recorded = report.recorded.len(),
                reasons = ?report.reasons,
                "cycle completed"
            );

            tokio::select! {
                () = tokio::time::sleep_until(started + self.config.cycle_period) => {}
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("measurement loop stopped");
        Ok(())
    }

    /// Process a batch of frames in arrival order.
    ///
    /// # Errors
    ///
    /// Returns storage errors while loading histories or saving records.
    pub async fn process_frames(
        &mut self,
        frames: &[RawFrame],
        profiles: &[UserProfile],
    ) -> Result<CycleReport, ScaleError> {
        let mut ordered: Vec<&RawFrame> = frames.iter().collect();
        ordered.sort_by_key(|frame| frame.sequence);

        let mut report = CycleReport::default();
        for raw in ordered {
            let outcome = self.process_frame(raw, profiles).await?;
            report.add(outcome);
        }
        Ok(report)
    }

    async fn process_frame(
        &mut self,
        raw: &RawFrame,
        profiles: &[UserProfile],
    ) -> Result<FrameOutcome, ScaleError> {
        let outcome = self.session.process_frame(raw);
        let reason = outcome.reason();
        let measurement = match outcome {
            SessionOutcome::WrongDevice => {
                tracing::trace!(reason, mac = %raw.address, "frame ignored");
                return Ok(FrameOutcome::Skipped(reason));
            }
            SessionOutcome::Malformed(error) => {
                tracing::debug!(reason, mac = %raw.address, %error, "frame ignored");
                return Ok(FrameOutcome::Skipped(reason));
            }
            SessionOutcome::Pending(_) => {
                tracing::debug!(reason, sequence = raw.sequence, "weigh-in not complete");
                return Ok(FrameOutcome::Skipped(reason));
            }
            SessionOutcome::Implausible(error) => {
                tracing::warn!(reason, %error, "measurement rejected");
                return Ok(FrameOutcome::Implausible(reason));
            }
            SessionOutcome::Duplicate(measurement) => {
                tracing::debug!(
                    reason,
                    weight_kg = measurement.weight_kg(),
                    impedance_ohm = measurement.impedance_ohm(),
                    "repeat of last accepted weigh-in"
                );
                return Ok(FrameOutcome::Duplicate);
            }
            SessionOutcome::Fresh(measurement) => measurement,
        };

        let attribution = self.attribute(&measurement, profiles).await?;
        let body = self.body_parameters(&measurement, attribution, profiles);
        let composition = match composition::compute(
            measurement.weight_kg(),
            measurement.impedance_ohm(),
            body,
        ) {
            Ok(composition) => composition,
            Err(error) => {
                let reason = error.reason();
                tracing::warn!(reason, %error, "measurement rejected");
                return Ok(FrameOutcome::Implausible(reason));
            }
        };

        let record = self
            .measurements
            .save(MetricsRecord::new(&measurement, &composition, attribution))
            .await?;
        tracing::info!(
            reason = "recorded",
            measurement_id = %record.id,
            weight_kg = record.weight,
            impedance_ohm = record.impedance,
            fat_percentage = record.fat_percentage,
            profile_id = ?record.attributed_user,
            "measurement recorded"
        );
        Ok(FrameOutcome::Recorded(Box::new(record)))
    }

    async fn attribute(
        &self,
        measurement: &ValidatedMeasurement,
        profiles: &[UserProfile],
    ) -> Result<Attribution, ScaleError> {
        let mut histories = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            let history = self.measurements.weight_history(profile.id).await?;
            histories.insert(profile.id, history);
        }

        let identification = attribution::identify(
            measurement.weight_kg(),
            &histories,
            profiles,
            &self.config.attribution,
        );
        for score in &identification.scores {
            tracing::debug!(
                profile_id = %score.profile_id,
                score = score.score,
                method = ?score.method,
                "attribution score"
            );
        }
        if identification.attribution == Attribution::Unknown {
            tracing::warn!(
                reason = "unknown_user",
                weight_kg = measurement.weight_kg(),
                "no profile within acceptance threshold, storing for review"
            );
        }
        Ok(identification.attribution)
    }

    fn body_parameters(
        &self,
        measurement: &ValidatedMeasurement,
        attribution: Attribution,
        profiles: &[UserProfile],
    ) -> BodyParameters {
        let on = measurement.captured_at().date_naive();
        attribution
            .profile_id()
            .and_then(|id| profiles.iter().find(|p| p.id == id))
            .map_or(self.config.fallback_body, |profile| {
                profile.body_parameters_on(on)
            })
    }

    async fn load_profiles(&self) -> Result<Vec<UserProfile>, ScaleError> {
        let today = bodyscale_domain::time::now().date_naive();
        let profiles = self.profiles.list().await?;
        Ok(profiles
            .into_iter()
            .filter(|profile| match profile.validate(today) {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(username = %profile.username, %error, "ignoring invalid profile");
                    false
                }
            })
            .collect())
    }
}
