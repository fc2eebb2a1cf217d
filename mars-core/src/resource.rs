use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::bitmap::Bitmap;
use crate::memory::MemoryBuffer;

/// Record type tags as stored in the container and as passed by guest code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum ResourceType {
    Placeholder = 1,
    Image = 2,
    Sprite = 3,
    Binary = 4,
    /// Unrestricted binary: same payload as `Binary`.
    UBin = 5,
    Skip = 6,
    Label = 9,
}

impl ResourceType {
    #[inline]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::from_u8(tag)
    }

    /// Guest-side type argument; anything outside `u8` is simply unknown.
    #[inline]
    pub fn from_guest(ty: i32) -> Option<Self> {
        Self::from_i32(ty)
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Placeholder => "PLACEHOLDER",
            ResourceType::Image => "IMAGE",
            ResourceType::Sprite => "SPRITE",
            ResourceType::Binary => "BINARY",
            ResourceType::UBin => "UBIN",
            ResourceType::Skip => "SKIP",
            ResourceType::Label => "LABEL",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("no resource handles left (last is {})", Handle::LAST)]
    HandlesExhausted,
}

/// A resource handle. Handles start at 1; 0 never names a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroU32);

impl Handle {
    pub const FIRST: Handle = Handle(NonZeroU32::MIN);

    /// Highest handle a guest word can name.
    pub const LAST: Handle = match NonZeroU32::new(i32::MAX as u32) {
        Some(raw) => Handle(raw),
        None => panic!("i32::MAX is non-zero"),
    };

    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Handle)
    }

    /// Handle from a guest word; zero and negative values are not handles.
    #[inline]
    pub fn from_guest(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().and_then(Self::new)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    fn next(self) -> Option<Self> {
        if self < Self::LAST {
            self.0.checked_add(1).map(Handle)
        } else {
            None
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Binary(MemoryBuffer),
    Image(Bitmap),
    Label(String),
}

impl Payload {
    /// Size in bytes of the payload as the guest sees it.
    pub fn byte_size(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Binary(m) => m.size(),
            Payload::Image(b) => b.as_raw().len(),
            Payload::Label(s) => s.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    ty: ResourceType,
    payload: Payload,
}

impl Resource {
    pub fn new(ty: ResourceType, payload: Payload) -> Self {
        Self { ty, payload }
    }

    pub fn placeholder() -> Self {
        Self::new(ResourceType::Placeholder, Payload::Empty)
    }

    pub fn binary(buffer: MemoryBuffer) -> Self {
        Self::new(ResourceType::Binary, Payload::Binary(buffer))
    }

    pub fn image(bitmap: Bitmap) -> Self {
        Self::new(ResourceType::Image, Payload::Image(bitmap))
    }

    #[inline]
    pub fn resource_type(&self) -> ResourceType {
        self.ty
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    pub fn as_buffer(&self) -> Option<&MemoryBuffer> {
        match &self.payload {
            Payload::Binary(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_buffer_mut(&mut self) -> Option<&mut MemoryBuffer> {
        match &mut self.payload {
            Payload::Binary(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_bitmap(&self) -> Option<&Bitmap> {
        match &self.payload {
            Payload::Image(b) => Some(b),
            _ => None,
        }
    }
}

/// Handle-addressed resources plus the counter that hands out new handles.
#[derive(Debug)]
pub struct ResourceTable {
    entries: BTreeMap<Handle, Resource>,
    /// `None` once [`Handle::LAST`] has been handed out.
    next_handle: Option<Handle>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_handle: Some(Handle::FIRST),
        }
    }

    /// Look up `handle`, succeeding only if the stored resource has type `ty`.
    ///
    /// A missing handle and a type mismatch both yield `None`.
    pub fn get(&self, ty: ResourceType, handle: Handle) -> Option<&Resource> {
        self.entries.get(&handle).filter(|r| r.ty == ty)
    }

    pub fn get_mut(&mut self, ty: ResourceType, handle: Handle) -> Option<&mut Resource> {
        self.entries.get_mut(&handle).filter(|r| r.ty == ty)
    }

    /// Untyped lookup, for tooling that lists the table.
    pub fn get_any(&self, handle: Handle) -> Option<&Resource> {
        self.entries.get(&handle)
    }

    /// Store `resource` at an explicit handle, returning whatever was there.
    ///
    /// The counter used by [`ResourceTable::add`] is left alone.
    pub fn set(&mut self, handle: Handle, resource: Resource) -> Option<Resource> {
        self.entries.insert(handle, resource)
    }

    /// Store `resource` at the next sequential handle.
    ///
    /// Fails without storing anything once the counter is past [`Handle::LAST`].
    pub fn add(&mut self, resource: Resource) -> Result<Handle, ResourceError> {
        let handle = self.advance_counter()?;
        self.entries.insert(handle, resource);
        Ok(handle)
    }

    /// The handle the next [`ResourceTable::add`] will use, if any is left.
    #[inline]
    pub fn next_handle(&self) -> Option<Handle> {
        self.next_handle
    }

    pub(crate) fn reset_counter(&mut self) {
        self.next_handle = Some(Handle::FIRST);
    }

    pub(crate) fn advance_counter(&mut self) -> Result<Handle, ResourceError> {
        let handle = self.next_handle.ok_or(ResourceError::HandlesExhausted)?;
        self.next_handle = handle.next();
        Ok(handle)
    }

    #[cfg(test)]
    pub(crate) fn set_counter(&mut self, next: Handle) {
        self.next_handle = Some(next);
    }

    pub fn find_label(&self, name: &str) -> Option<Handle> {
        self.entries.iter().find_map(|(h, r)| match &r.payload {
            Payload::Label(l) if l == name => Some(*h),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resources in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Resource)> {
        self.entries.iter().map(|(h, r)| (*h, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(raw: u32) -> Handle {
        Handle::new(raw).unwrap()
    }

    #[test]
    fn add_hands_out_sequential_handles() {
        let mut t = ResourceTable::new();
        let handles: Vec<u32> = (0..5).map(|_| t.add(Resource::placeholder()).unwrap().get()).collect();
        assert_eq!(handles, vec![1, 2, 3, 4, 5]);
        assert_eq!(t.next_handle(), Some(h(6)));
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn typed_lookup_rejects_other_types() {
        let mut t = ResourceTable::new();
        let bin = t.add(Resource::binary(MemoryBuffer::new(4))).unwrap();
        assert!(t.get(ResourceType::Binary, bin).is_some());
        assert!(t.get(ResourceType::Image, bin).is_none());
        assert!(t.get(ResourceType::UBin, bin).is_none());
        assert!(t.get(ResourceType::Binary, h(99)).is_none());
        assert!(t.get_mut(ResourceType::Placeholder, bin).is_none());
    }

    #[test]
    fn set_overwrites_without_touching_counter() {
        let mut t = ResourceTable::new();
        assert!(t.set(h(10), Resource::placeholder()).is_none());
        assert_eq!(t.next_handle(), Some(Handle::FIRST));

        let prev = t.set(h(10), Resource::binary(MemoryBuffer::new(1)));
        assert_eq!(prev.map(|r| r.resource_type()), Some(ResourceType::Placeholder));
        assert_eq!(t.get_any(h(10)).map(|r| r.resource_type()), Some(ResourceType::Binary));
        assert_eq!(t.add(Resource::placeholder()), Ok(h(1)));
    }

    #[test]
    fn guest_handles() {
        assert_eq!(Handle::from_guest(3), Some(h(3)));
        assert_eq!(Handle::from_guest(0), None);
        assert_eq!(Handle::from_guest(-1), None);
    }

    #[test]
    fn guest_types() {
        assert_eq!(ResourceType::from_guest(4), Some(ResourceType::Binary));
        assert_eq!(ResourceType::from_guest(7), None);
        assert_eq!(ResourceType::from_guest(0x104), None);
        assert_eq!(ResourceType::from_tag(9), Some(ResourceType::Label));
    }

    #[test]
    fn labels() {
        let mut t = ResourceTable::new();
        t.add(Resource::placeholder()).unwrap();
        let l = t
            .add(Resource::new(ResourceType::Label, Payload::Label("intro".into())))
            .unwrap();
        assert_eq!(t.find_label("intro"), Some(l));
        assert_eq!(t.find_label("outro"), None);
    }

    #[test]
    fn counter_stops_at_last_guest_handle() {
        let mut t = ResourceTable::new();
        t.set_counter(Handle::new(i32::MAX as u32 - 1).unwrap());
        t.add(Resource::placeholder()).unwrap();
        assert_eq!(t.add(Resource::placeholder()), Ok(Handle::LAST));
        assert_eq!(t.next_handle(), None);

        let err = t.add(Resource::binary(MemoryBuffer::new(1))).unwrap_err();
        assert_eq!(err, ResourceError::HandlesExhausted);
        assert_eq!(t.len(), 2);
        assert!(t.get(ResourceType::Placeholder, Handle::LAST).is_some());
        assert_eq!(Handle::from_guest(i32::MAX), Some(Handle::LAST));

        t.reset_counter();
        assert_eq!(t.add(Resource::placeholder()), Ok(Handle::FIRST));
    }

    #[test]
    fn payload_can_be_edited_in_place() {
        let mut t = ResourceTable::new();
        let bin = t.add(Resource::binary(MemoryBuffer::new(2))).unwrap();
        let res = t.get_mut(ResourceType::Binary, bin).unwrap();
        res.as_buffer_mut().unwrap().write_bytes(1, &[0x5A]).unwrap();
        assert_eq!(res.as_buffer().unwrap().as_bytes(), &[0, 0x5A]);

        *res.payload_mut() = Payload::Empty;
        assert_eq!(res.payload().byte_size(), 0);
        assert!(res.as_buffer_mut().is_none());
    }

    #[test]
    fn image_resources_carry_bitmaps() {
        let res = Resource::image(Bitmap::new(2, 3));
        assert_eq!(res.resource_type(), ResourceType::Image);
        assert_eq!(res.as_bitmap().map(|b| b.dimensions()), Some((2, 3)));
        assert_eq!(res.payload().byte_size(), 2 * 3 * 4);
        assert!(res.as_buffer().is_none());
    }
}
