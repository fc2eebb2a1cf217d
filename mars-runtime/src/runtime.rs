use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mars_core::{
    FormatError, Handle, ImageDecoder, LoadSummary, MemoryBuffer, MemoryError, RasterDecoder,
    Resource, ResourceError, ResourceLoader, ResourceTable, ResourceType,
};
use mars_events::EventQueue;

use crate::config::RuntimeConfig;
use crate::error::{RegistryError, RuntimeError};
use crate::event::{self, Event};
use crate::host::{HostDispatch, InlineHost};
use crate::input::InputHub;
use crate::logging;
use crate::syscall::{
    GuestCore, SyscallEnv, SyscallGroup, SyscallId, SyscallRegistry, SyscallReturn,
    SYSCALL_GROUPS,
};
use crate::trace;

/// Called on the host thread when guest code panics.
pub type PanicHook = Arc<dyn Fn(i32, &str) + Send + Sync>;

pub fn default_panic_hook() -> PanicHook {
    Arc::new(|code: i32, message: &str| {
        log::error!("guest application stopped (code {}): {}", code, message);
    })
}

/// Builds a [`RuntimeCore`]. The syscall table is assembled and frozen in
/// [`RuntimeBuilder::build`].
pub struct RuntimeBuilder {
    host: Arc<dyn HostDispatch>,
    panic_hook: PanicHook,
    decoder: Option<Box<dyn ImageDecoder>>,
    groups: Vec<&'static (dyn SyscallGroup + Sync)>,
    warn_unbound: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            host: Arc::new(InlineHost),
            panic_hook: default_panic_hook(),
            decoder: Some(Box::new(RasterDecoder)),
            groups: SYSCALL_GROUPS.to_vec(),
            warn_unbound: true,
        }
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: Arc<dyn HostDispatch>) -> Self {
        self.host = host;
        self
    }

    pub fn with_panic_hook(mut self, hook: impl Fn(i32, &str) + Send + Sync + 'static) -> Self {
        self.panic_hook = Arc::new(hook);
        self
    }

    pub fn with_image_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// IMAGE records stay compressed, as binary payloads.
    pub fn without_image_decoding(mut self) -> Self {
        self.decoder = None;
        self
    }

    /// Register `group` after the built-in ones.
    pub fn with_group(mut self, group: &'static (dyn SyscallGroup + Sync)) -> Self {
        self.groups.push(group);
        self
    }

    /// Start from an empty group list instead of the built-in one.
    pub fn without_builtin_groups(mut self) -> Self {
        self.groups.clear();
        self
    }

    pub fn with_unbound_warnings(mut self, warn: bool) -> Self {
        self.warn_unbound = warn;
        self
    }

    pub fn build(self) -> Result<RuntimeCore, RegistryError> {
        let mut registry = SyscallRegistry::new();
        for group in &self.groups {
            group.register(&mut registry)?;
            log::debug!("registered syscall group {}", group.name());
        }

        if self.warn_unbound {
            for id in registry.unbound() {
                log::warn!("syscall {} has no implementation", id);
            }
        }
        log::info!("syscall table ready: {} bound", registry.len());

        Ok(RuntimeCore {
            registry,
            resources: ResourceTable::new(),
            events: Arc::new(EventQueue::new()),
            host: self.host,
            panic_hook: self.panic_hook,
            decoder: self.decoder,
        })
    }
}

/// The runtime bridge owned by the VM thread.
///
/// The interpreter is not stored here; it passes itself as a [`GuestCore`] on each
/// [`RuntimeCore::invoke`].
pub struct RuntimeCore {
    registry: SyscallRegistry,
    resources: ResourceTable,
    events: Arc<EventQueue<Event>>,
    host: Arc<dyn HostDispatch>,
    panic_hook: PanicHook,
    decoder: Option<Box<dyn ImageDecoder>>,
}

impl RuntimeCore {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Runtime with every built-in syscall group.
    pub fn new(host: Arc<dyn HostDispatch>) -> Result<Self, RegistryError> {
        RuntimeBuilder::new().with_host(host).build()
    }

    /// Installs the configured logger, builds the runtime and loads the configured
    /// resource container.
    pub fn from_config(config: &RuntimeConfig, host: Arc<dyn HostDispatch>) -> anyhow::Result<Self> {
        if let Some(logger_config) = &config.logger_config {
            logging::init_logger(logger_config);
        }
        log::info!("starting runtime for {}", config.app_name);

        let mut builder = RuntimeBuilder::new()
            .with_host(host)
            .with_unbound_warnings(config.warn_unbound_syscalls);
        if !config.decode_images {
            builder = builder.without_image_decoding();
        }
        let mut runtime = builder.build()?;

        if let Some(path) = &config.resource_path {
            runtime.load_resource_file(path)?;
        }
        Ok(runtime)
    }

    pub fn registry(&self) -> &SyscallRegistry {
        &self.registry
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Not-found covers both a missing handle and a resource of another type.
    pub fn get_resource(&self, ty: ResourceType, handle: Handle) -> Option<&Resource> {
        self.resources.get(ty, handle)
    }

    pub fn get_resource_mut(&mut self, ty: ResourceType, handle: Handle) -> Option<&mut Resource> {
        self.resources.get_mut(ty, handle)
    }

    /// [`RuntimeCore::get_resource`] with raw guest words.
    pub fn get_guest_resource(&self, ty: i32, handle: i32) -> Option<&Resource> {
        let ty = ResourceType::from_guest(ty)?;
        self.get_resource(ty, Handle::from_guest(handle)?)
    }

    pub fn set_resource(&mut self, handle: Handle, resource: Resource) -> Option<Resource> {
        trace::resource(format_args!("set #{} to {}", handle, resource.resource_type()));
        self.resources.set(handle, resource)
    }

    pub fn add_resource(&mut self, resource: Resource) -> Result<Handle, ResourceError> {
        let ty = resource.resource_type();
        let handle = self.resources.add(resource)?;
        trace::resource(format_args!("added {} as #{}", ty, handle));
        Ok(handle)
    }

    /// Load a container. Records that were inserted before a failure stay in place.
    pub fn load_resources<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<LoadSummary, FormatError> {
        let loader = ResourceLoader::new(self.decoder.as_deref());
        match loader.load(reader, &mut self.resources) {
            Ok(summary) => {
                log::info!("loaded {} resources ({} payload bytes)", summary.records, summary.payload_bytes);
                Ok(summary)
            }
            Err(e) => {
                log::error!("resource load failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn load_resource_file(&mut self, path: &Path) -> anyhow::Result<LoadSummary> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let summary = self
            .load_resources(&mut BufReader::new(file))
            .with_context(|| format!("loading {}", path.display()))?;
        Ok(summary)
    }

    pub fn post_event(&self, ev: Event) {
        trace::event(format_args!("posted {:?}", ev));
        self.events.post(ev);
    }

    /// Write the oldest pending event at `addr`. `Ok(false)` when none is queued.
    pub fn poll_event(&self, memory: &mut MemoryBuffer, addr: i32) -> Result<bool, MemoryError> {
        event::poll_into(&self.events, memory, addr)
    }

    /// Block the VM thread until an event is queued or `timeout` runs out.
    pub fn wait_event(&self, timeout: Option<Duration>) -> bool {
        self.events.wait_timeout(timeout)
    }

    /// Shared queue, for the host thread.
    pub fn events(&self) -> &Arc<EventQueue<Event>> {
        &self.events
    }

    pub fn input_hub(&self) -> InputHub {
        InputHub::new(self.events.clone())
    }

    pub fn host(&self) -> &Arc<dyn HostDispatch> {
        &self.host
    }

    /// Run `f` on the host thread and wait for it.
    pub fn run_on_host(&self, f: impl FnOnce() + Send + 'static) {
        self.host.run_blocking(Box::new(f));
    }

    pub fn invoke(
        &self,
        core: &mut dyn GuestCore,
        id: SyscallId,
        args: &[i32],
    ) -> Result<SyscallReturn, RuntimeError> {
        let mut env = SyscallEnv {
            core,
            resources: &self.resources,
            events: &self.events,
            host: self.host.as_ref(),
            panic_hook: &self.panic_hook,
        };
        self.registry.invoke(id, &mut env, args)
    }

    pub fn invoke_named(
        &self,
        core: &mut dyn GuestCore,
        name: &str,
        args: &[i32],
    ) -> Result<SyscallReturn, RuntimeError> {
        let id = SyscallRegistry::lookup(name)?;
        self.invoke(core, id, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use mars_core::{Bitmap, ContainerWriter, Payload};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn runtime() -> RuntimeCore {
        RuntimeCore::new(Arc::new(InlineHost)).unwrap()
    }

    #[test]
    fn add_resource_counts_from_one() {
        let mut rt = runtime();
        let handles: Vec<u32> = (0..5)
            .map(|_| rt.add_resource(Resource::placeholder()).unwrap().get())
            .collect();
        assert_eq!(handles, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn lookup_is_type_checked() {
        let mut rt = runtime();
        let h = rt.add_resource(Resource::binary(MemoryBuffer::new(4))).unwrap();
        assert!(rt.get_resource(ResourceType::Binary, h).is_some());
        assert!(rt.get_resource(ResourceType::Image, h).is_none());
        assert!(rt.get_guest_resource(4, 1).is_some());
        assert!(rt.get_guest_resource(4, 0).is_none());
        assert!(rt.get_guest_resource(99, 1).is_none());
    }

    #[test]
    fn set_resource_leaves_counter() {
        let mut rt = runtime();
        let h7 = Handle::new(7).unwrap();
        assert!(rt.set_resource(h7, Resource::placeholder()).is_none());
        assert!(rt.set_resource(h7, Resource::binary(MemoryBuffer::new(1))).is_some());
        assert_eq!(rt.add_resource(Resource::placeholder()).unwrap().get(), 1);
        assert!(rt.get_resource(ResourceType::Binary, h7).is_some());
    }

    #[test]
    fn undecoded_images_stay_binary() {
        let mut rt = RuntimeCore::builder().without_image_decoding().build().unwrap();
        let bytes = ContainerWriter::new().image(vec![1, 2, 3]).to_bytes().unwrap();
        rt.load_resources(&mut Cursor::new(bytes)).unwrap();

        let res = rt.get_resource(ResourceType::Image, Handle::FIRST).unwrap();
        assert!(matches!(res.payload(), Payload::Binary(m) if m.as_bytes() == [1, 2, 3]));
    }

    #[test]
    fn builder_rejects_duplicate_groups() {
        let err = RuntimeCore::builder()
            .with_group(&crate::syscall::Transcendental)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateBinding { id: SyscallId::Sin, .. }));
    }

    #[test]
    fn empty_builder_has_empty_table() {
        let rt = RuntimeCore::builder().without_builtin_groups().build().unwrap();
        assert!(rt.registry().is_empty());
        let mut mem = MemoryBuffer::new(4);
        let err = rt.invoke(&mut mem, SyscallId::Sqrt, &[0, 0]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn resources_can_be_edited_through_the_runtime() {
        let mut rt = runtime();
        let h = rt.add_resource(Resource::binary(MemoryBuffer::new(4))).unwrap();
        rt.get_resource_mut(ResourceType::Binary, h)
            .and_then(Resource::as_buffer_mut)
            .unwrap()
            .write::<i32>(0, -2)
            .unwrap();
        assert!(rt.get_resource_mut(ResourceType::UBin, h).is_none());

        let buf = rt.get_resource(ResourceType::Binary, h).unwrap().as_buffer().unwrap();
        assert_eq!(buf.read::<i32>(0).unwrap(), -2);
    }

    struct SolidDecoder;

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, bytes: &[u8]) -> anyhow::Result<Bitmap> {
            Ok(Bitmap::new(bytes.len() as u32, 1))
        }
    }

    #[test]
    fn custom_image_decoder_is_used_for_loads() {
        let mut rt = RuntimeCore::builder().with_image_decoder(SolidDecoder).build().unwrap();
        let bytes = ContainerWriter::new().image(vec![0; 5]).to_bytes().unwrap();
        rt.load_resources(&mut Cursor::new(bytes)).unwrap();

        let res = rt.get_resource(ResourceType::Image, Handle::FIRST).unwrap();
        assert_eq!(res.as_bitmap().map(|b| b.dimensions()), Some((5, 1)));
    }

    #[test]
    fn builtin_groups_bind_the_table() {
        let rt = runtime();
        let registry = rt.registry();
        assert!(registry.is_bound(SyscallId::Sqrt));
        assert!(registry.is_bound(SyscallId::GetEvent));
        assert_eq!(registry.bound().count(), registry.len());
        assert!(registry.bound().all(|(id, _)| registry.is_bound(id)));

        let empty = RuntimeCore::builder().without_builtin_groups().build().unwrap();
        assert!(!empty.registry().is_bound(SyscallId::Sqrt));
        assert_eq!(empty.registry().bound().count(), 0);
    }

    #[test]
    fn wait_event_accepts_unbounded_timeout() {
        let rt = runtime();
        rt.post_event(Event::close());
        assert!(rt.wait_event(Some(Duration::MAX)));

        let mut mem = MemoryBuffer::new(12);
        assert!(rt.poll_event(&mut mem, 0).unwrap());
        assert_eq!(mem.read::<i32>(0).unwrap(), EventType::Close as i32);
    }
}
