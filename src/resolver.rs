use crate::config::ResolverConfig;
use crate::element::ElementRef;
use crate::loader::ImageLoader;
use crate::mode::Mode;
use crate::result::{BgSizeError, BgSizeErrorKind, BgSizeResult};
use crate::style::StyleReader;
use crate::types::{ImageDescriptor, ImageSize, ResolvedImages};
use crate::util::extract_css_urls::extract_css_urls;
use crate::err;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Identifies one resolution cycle. Ids increase monotonically per resolver.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CycleId(u64);

impl Display for CycleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}

/// How a resolution cycle ended
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CycleOutcome {
    /// A value (possibly `ResolvedImages::Failed`) was published
    Published,
    /// The computed `background-image` contained no `url(...)`
    NoMatches,
    /// The element was absent when its style was read or when publishing
    ElementAbsent,
    /// A newer cycle was started before this one finished
    Stale,
    /// The cycle thread panicked
    Aborted,
}

enum CycleJoin {
    Running(JoinHandle<CycleOutcome>),
    Finished(CycleOutcome),
}

/// Handle of a started resolution cycle
pub struct CycleHandle {
    id: CycleId,
    join: CycleJoin,
}

impl CycleHandle {
    pub fn id(&self) -> CycleId {
        self.id
    }

    /// Blocks until the cycle has ended.
    ///
    /// Without a configured load timeout this never returns if a load never completes.
    pub fn wait(self) -> CycleOutcome {
        match self.join {
            CycleJoin::Running(handle) => handle.join().unwrap_or(CycleOutcome::Aborted),
            CycleJoin::Finished(outcome) => outcome,
        }
    }
}

/// Result of [`ImageSizeResolver::resolve`]: the element ref, the currently
/// published images and, in manual trigger mode, the trigger.
#[derive(Clone, Debug)]
pub enum Resolution {
    Images(ElementRef, Option<ResolvedImages>),
    WithTrigger(ElementRef, Option<ResolvedImages>, Trigger),
}

impl Resolution {
    pub fn element_ref(&self) -> &ElementRef {
        match self {
            Resolution::Images(element_ref, _) => element_ref,
            Resolution::WithTrigger(element_ref, _, _) => element_ref,
        }
    }

    pub fn images(&self) -> Option<&ResolvedImages> {
        match self {
            Resolution::Images(_, images) => images.as_ref(),
            Resolution::WithTrigger(_, images, _) => images.as_ref(),
        }
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        match self {
            Resolution::Images(..) => None,
            Resolution::WithTrigger(_, _, trigger) => Some(trigger),
        }
    }
}

/// Runs a background-image resolution cycle on demand
#[derive(Clone)]
pub struct Trigger {
    shared: Arc<ResolverShared>,
}

impl Trigger {
    pub fn invoke(&self) -> CycleHandle {
        let cycle_id = self.shared.begin_cycle(false);
        start_cycle(&self.shared, cycle_id, Mode::ManualTrigger)
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("element_ref", &self.shared.element_ref)
            .finish()
    }
}

struct ResolverState {
    images: Option<ResolvedImages>,
    latest_cycle: u64,
}

struct ResolverShared {
    element_ref: ElementRef,
    loader: Arc<dyn ImageLoader>,
    style_reader: Arc<dyn StyleReader>,
    config: ResolverConfig,
    state: Mutex<ResolverState>,
    update_sender: Sender<ResolvedImages>,
    update_receiver: Receiver<ResolvedImages>,
}

/// Resolves the natural pixel size of images, either given as URLs or taken
/// from the computed `background-image` of the element in its [`ElementRef`].
///
/// Call [`resolve`](Self::resolve) with the current input on every update of
/// the owning component; a new cycle only starts when the input differs from
/// the previous call. Loads run on background threads and the result is
/// published once all of them have finished, unless the element has been
/// detached in the meantime or a newer cycle was started.
pub struct ImageSizeResolver {
    shared: Arc<ResolverShared>,
    mode: Option<Mode>,
    last_cycle: Option<CycleHandle>,
}

impl ImageSizeResolver {
    pub fn new(
        loader: Arc<dyn ImageLoader>,
        style_reader: Arc<dyn StyleReader>,
        config: ResolverConfig,
    ) -> Self {
        Self::with_element_ref(loader, style_reader, config, ElementRef::new())
    }

    pub fn with_element_ref(
        loader: Arc<dyn ImageLoader>,
        style_reader: Arc<dyn StyleReader>,
        config: ResolverConfig,
        element_ref: ElementRef,
    ) -> Self {
        // Holds at most the latest unobserved publish.
        let (update_sender, update_receiver) = crossbeam_channel::bounded(1);
        ImageSizeResolver {
            shared: Arc::new(ResolverShared {
                element_ref,
                loader,
                style_reader,
                config,
                state: Mutex::new(ResolverState {
                    images: None,
                    latest_cycle: 0,
                }),
                update_sender,
                update_receiver,
            }),
            mode: None,
            last_cycle: None,
        }
    }

    pub fn element_ref(&self) -> &ElementRef {
        &self.shared.element_ref
    }

    pub fn mode(&self) -> Option<&Mode> {
        self.mode.as_ref()
    }

    pub fn images(&self) -> Option<ResolvedImages> {
        self.shared.lock_state().images.clone()
    }

    pub fn resolve<M: Into<Mode>>(&mut self, input: M) -> Resolution {
        let mode = input.into();
        if self.mode.as_ref() != Some(&mode) {
            debug!("Resolver input changed to {}", mode);
            let cycle_id = self.shared.begin_cycle(true);
            self.last_cycle = mode
                .runs_automatically()
                .then(|| start_cycle(&self.shared, cycle_id, mode.clone()));
            self.mode = Some(mode);
        }
        let element_ref = self.shared.element_ref.clone();
        let images = self.images();
        match self.mode {
            Some(Mode::ManualTrigger) => Resolution::WithTrigger(
                element_ref,
                images,
                Trigger {
                    shared: self.shared.clone(),
                },
            ),
            _ => Resolution::Images(element_ref, images),
        }
    }

    /// Takes the handle of the cycle started automatically by the last input change
    pub fn take_cycle(&mut self) -> Option<CycleHandle> {
        self.last_cycle.take()
    }

    /// Waits for a value published by the current input's cycles.
    ///
    /// Returns the latest unobserved publish if there is one. Values published
    /// before the last input change or trigger invocation are never returned.
    pub fn next_update(&self, timeout: Duration) -> Option<ResolvedImages> {
        self.shared.update_receiver.recv_timeout(timeout).ok()
    }
}

impl ResolverShared {
    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_cycle(&self, reset: bool) -> CycleId {
        let mut state = self.lock_state();
        if reset {
            state.images = None;
        }
        state.latest_cycle += 1;
        self.discard_unobserved_update();
        CycleId(state.latest_cycle)
    }

    fn discard_unobserved_update(&self) {
        while self.update_receiver.try_recv().is_ok() {}
    }

    fn run_cycle(&self, cycle_id: CycleId, mode: Mode) -> CycleOutcome {
        debug!("Starting {} for {}", cycle_id, mode);
        let (urls, collapse_single) = match mode {
            Mode::SingleUrl(url) => (vec![url], true),
            Mode::UrlList(urls) => (urls, false),
            Mode::Auto | Mode::ManualTrigger => match self.background_image_urls(cycle_id) {
                Ok(urls) => (urls, true),
                Err(outcome) => return outcome,
            },
        };
        let images = match self.load_all(cycle_id, &urls) {
            Ok(mut descriptors) if collapse_single && descriptors.len() == 1 => {
                ResolvedImages::Single(descriptors.remove(0))
            }
            Ok(descriptors) => ResolvedImages::Multiple(descriptors),
            Err(error) => {
                warn!("{} failed: {}", cycle_id, error);
                ResolvedImages::failed(error.kind().to_string())
            }
        };
        self.publish(cycle_id, images)
    }

    fn background_image_urls(&self, cycle_id: CycleId) -> Result<Vec<String>, CycleOutcome> {
        let Some(element) = self.element_ref.current() else {
            debug!("{}: no element attached, nothing to read", cycle_id);
            return Err(CycleOutcome::ElementAbsent);
        };
        let Some(background_image) = self.style_reader.background_image(element) else {
            debug!("{}: no computed style for {}", cycle_id, element);
            return Err(CycleOutcome::NoMatches);
        };
        match extract_css_urls(&background_image) {
            Ok(urls) if !urls.is_empty() => Ok(urls),
            Ok(_) => {
                debug!(
                    "{}: no url() in background-image '{}' of {}",
                    cycle_id, background_image, element
                );
                Err(CycleOutcome::NoMatches)
            }
            Err(error) => {
                warn!("{}: could not extract urls: {}", cycle_id, error);
                Err(CycleOutcome::NoMatches)
            }
        }
    }

    /// Loads all urls concurrently and returns their descriptors in input order.
    fn load_all(&self, cycle_id: CycleId, urls: &[String]) -> BgSizeResult<Vec<ImageDescriptor>> {
        let (sender, receiver) = crossbeam_channel::bounded(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let worker_sender = sender.clone();
            let loader = self.loader.clone();
            let worker_url = url.clone();
            let spawned = thread::Builder::new()
                .name(format!(
                    "{}-load-{}-{}",
                    self.config.thread_name_prefix, cycle_id.0, index
                ))
                .spawn(move || {
                    let result = loader.load(&worker_url);
                    // The receiver is gone once the cycle timed out.
                    let _ = worker_sender.send((index, result));
                });
            if let Err(error) = spawned {
                let _ = sender.send((index, Err(BgSizeError::from(error))));
            }
        }
        drop(sender);

        let deadline = self
            .config
            .load_timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let mut results: Vec<Option<BgSizeResult<ImageSize>>> = urls.iter().map(|_| None).collect();
        for received in 0..urls.len() {
            let message = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match message {
                Ok((index, result)) => results[index] = Some(result),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(BgSizeError::new(BgSizeErrorKind::Timeout {
                        pending: urls.len() - received,
                    }));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(err!("image loader stopped without reporting a result"));
                }
            }
        }

        urls.iter()
            .zip(results)
            .map(|(url, result)| match result {
                Some(Ok(size)) => Ok(ImageDescriptor::new(url.clone(), size)),
                Some(Err(error)) => Err(into_load_error(url, error)),
                None => Err(err!("no result for '{}'", url)),
            })
            .collect()
    }

    fn publish(&self, cycle_id: CycleId, images: ResolvedImages) -> CycleOutcome {
        let mut state = self.lock_state();
        if !self.element_ref.is_present() {
            debug!("{}: element detached, discarding result", cycle_id);
            return CycleOutcome::ElementAbsent;
        }
        if self.config.discard_stale_cycles && cycle_id.0 != state.latest_cycle {
            debug!(
                "{}: superseded by cycle#{}, discarding result",
                cycle_id, state.latest_cycle
            );
            return CycleOutcome::Stale;
        }
        info!(
            "{}: publishing [{}]",
            cycle_id,
            images.descriptors().iter().map(|d| format!("{} {}", d.src, d.size())).join(", ")
        );
        state.images = Some(images.clone());
        self.discard_unobserved_update();
        // Publishes are serialized by the state lock, so the slot is free here.
        let _ = self.update_sender.try_send(images);
        CycleOutcome::Published
    }
}

fn into_load_error(url: &str, error: BgSizeError) -> BgSizeError {
    match error.kind() {
        BgSizeErrorKind::ImageLoad { .. } | BgSizeErrorKind::UnsupportedScheme(_) => error,
        kind => {
            let reason = kind.to_string();
            BgSizeError(error.0.change_context(BgSizeErrorKind::ImageLoad {
                src: url.to_string(),
                reason,
            }))
        }
    }
}

fn start_cycle(shared: &Arc<ResolverShared>, cycle_id: CycleId, mode: Mode) -> CycleHandle {
    let thread_shared = shared.clone();
    let spawned = thread::Builder::new()
        .name(format!("{}-cycle-{}", shared.config.thread_name_prefix, cycle_id.0))
        .spawn(move || thread_shared.run_cycle(cycle_id, mode));
    let join = match spawned {
        Ok(handle) => CycleJoin::Running(handle),
        Err(error) => {
            warn!("Could not start {}: {}", cycle_id, error);
            CycleJoin::Finished(
                shared.publish(cycle_id, ResolvedImages::failed(error.to_string())),
            )
        }
    };
    CycleHandle { id: cycle_id, join }
}
