//! Record metadata.
//!
//! Rust has no runtime reflection, so every record type describes its
//! properties once through a [`RecordBuilder`]. The result is a
//! [`RecordType`]: an ordered set of [`PropertyDescriptor`]s with type-erased
//! readers and writers, an optional zero-argument constructor and an
//! optional parent record. Descriptions are cached process-wide (see
//! [`record_type`]).
//!
//! ```rust,ignore
//! #[derive(Clone, Default)]
//! struct Company { name: String, founded: Option<i32> }
//!
//! impl Record for Company {
//!     fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
//!         builder
//!             .default_constructor()
//!             .field("name", |c| &c.name, |c| &mut c.name)
//!             .field("founded", |c| &c.founded, |c| &mut c.founded)
//!     }
//! }
//! ```

mod cache;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{MapperError, MapperResult};
use crate::typed::Typed;
use crate::types::{ValueType, short_type_name};
use crate::value::{Instance, RecordRef, Value};

pub use cache::{enum_type, record_type};

/// Type-erased property reader.
pub type Reader = Arc<dyn Fn(&dyn Any) -> MapperResult<Value> + Send + Sync>;

/// A decoded property value waiting to be assigned.
type Staged = Box<dyn Any + Send>;

type Decode = Arc<dyn Fn(Value) -> MapperResult<Staged> + Send + Sync>;

type Assign = Arc<dyn Fn(&mut dyn Any, Staged) -> MapperResult<()> + Send + Sync>;

/// Type-erased property writer.
///
/// Decoding runs before the instance is locked, so a value that refers back
/// to the instance being written can still be extracted.
#[derive(Clone)]
struct Writer {
    decode: Decode,
    assign: Assign,
}

/// A write whose value has been decoded but not yet assigned.
pub(crate) struct PreparedWrite {
    assign: Assign,
    staged: Staged,
}

impl PreparedWrite {
    pub(crate) fn apply(self, instance: &mut dyn Any) -> MapperResult<()> {
        (self.assign)(instance, self.staged)
    }
}

type Constructor = Arc<dyn Fn() -> Instance + Send + Sync>;

type Upcast = Arc<dyn Fn(&dyn Any) -> Option<Instance> + Send + Sync>;

// ============================================================================
// RECORD TRAIT
// ============================================================================

/// A Rust type whose properties the mapper can read and write by name.
///
/// Implementors also usually invoke [`impl_typed_record!`](crate::impl_typed_record)
/// so the type can be used as a property type and with [`Mapper::to`](crate::Mapper::to).
pub trait Record: Any + Clone + Send + Sync {
    /// Declares the record's properties.
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self>;
}

// ============================================================================
// PROPERTY DESCRIPTOR
// ============================================================================

/// One declared property.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    value_type: fn() -> ValueType,
    reader: Option<Reader>,
    writer: Option<Writer>,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type. Resolved on demand so self-referential records work.
    pub fn value_type(&self) -> ValueType {
        (self.value_type)()
    }

    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

/// Public summary of a property, as returned by [`RecordType::describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub value_type: ValueType,
    pub readable: bool,
    pub writable: bool,
}

// ============================================================================
// RECORD TYPE
// ============================================================================

/// Metadata of a record type. Cheap to clone; equality is by Rust type.
#[derive(Clone)]
pub struct RecordType(Arc<RecordMeta>);

struct RecordMeta {
    name: String,
    type_id: TypeId,
    properties: IndexMap<String, PropertyDescriptor>,
    constructor: Option<Constructor>,
    parent: Option<ParentLink>,
}

struct ParentLink {
    ty: RecordType,
    upcast: Upcast,
}

impl RecordType {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// Number of declared properties, inherited ones included.
    pub fn len(&self) -> usize {
        self.0.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.properties.is_empty()
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.0.properties.values()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.0.properties.get(name)
    }

    /// Summary of every property in declaration order.
    pub fn describe(&self) -> Vec<PropertyInfo> {
        self.properties()
            .map(|p| PropertyInfo {
                name: p.name.clone(),
                value_type: p.value_type(),
                readable: p.is_readable(),
                writable: p.is_writable(),
            })
            .collect()
    }

    pub fn readable_names(&self) -> Vec<String> {
        self.properties()
            .filter(|p| p.is_readable())
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn writable_names(&self) -> Vec<String> {
        self.properties()
            .filter(|p| p.is_writable())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Reads `name` from `instance`.
    ///
    /// Returns `Ok(None)` for an undeclared name and
    /// [`MapperError::PropertyAccessFailed`] for a property without a reader.
    pub fn read(&self, instance: &dyn Any, name: &str) -> MapperResult<Option<Value>> {
        let Some(property) = self.property(name) else {
            return Ok(None);
        };
        let reader = property
            .reader
            .as_ref()
            .ok_or_else(|| MapperError::property_access(self.name(), name, "property is not readable"))?;
        reader(instance).map(Some)
    }

    /// Writes `value` into `name` on `instance`.
    ///
    /// Returns `Ok(false)` without touching the instance when the property
    /// is undeclared or has no writer.
    pub fn write(&self, instance: &mut dyn Any, name: &str, value: Value) -> MapperResult<bool> {
        let Some(prepared) = self.prepare_write(name, value)? else {
            return Ok(false);
        };
        prepared.apply(instance)?;
        Ok(true)
    }

    /// Decodes `value` for property `name` without touching any instance.
    pub(crate) fn prepare_write(&self, name: &str, value: Value) -> MapperResult<Option<PreparedWrite>> {
        let Some(writer) = self.property(name).and_then(|p| p.writer.as_ref()) else {
            return Ok(None);
        };
        let staged = (writer.decode)(value)?;
        Ok(Some(PreparedWrite {
            assign: Arc::clone(&writer.assign),
            staged,
        }))
    }

    /// Creates a fresh instance through the declared constructor.
    pub fn instantiate(&self) -> MapperResult<RecordRef> {
        let constructor = self
            .0
            .constructor
            .as_ref()
            .ok_or_else(|| MapperError::instantiation(self.name()))?;
        Ok(RecordRef::from_parts(self.clone(), constructor()))
    }

    /// Declared parent record, if any.
    pub fn parent(&self) -> Option<&RecordType> {
        self.0.parent.as_ref().map(|link| &link.ty)
    }

    /// Returns `true` when `ancestor` is a (transitive) parent of this type.
    pub fn extends(&self, ancestor: &RecordType) -> bool {
        let mut current = self.parent();
        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Number of ancestors.
    pub fn ancestry_depth(&self) -> usize {
        std::iter::successors(self.parent(), |ty| ty.parent()).count()
    }

    /// Projects `instance` onto the ancestor with type id `target`.
    pub(crate) fn upcast(&self, target: TypeId, instance: &dyn Any) -> Option<Instance> {
        let link = self.0.parent.as_ref()?;
        let projected = (link.upcast)(instance)?;
        if link.ty.type_id() == target {
            return Some(projected);
        }
        link.ty.upcast(target, &*projected)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_id == other.0.type_id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.type_id.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.0.name)
            .field("properties", &self.0.properties.keys().collect::<Vec<_>>())
            .field("parent", &self.parent().map(RecordType::name))
            .finish()
    }
}

// ============================================================================
// RECORD BUILDER
// ============================================================================

/// Declares the properties of record type `T`.
pub struct RecordBuilder<T: Record> {
    name: String,
    properties: IndexMap<String, PropertyDescriptor>,
    constructor: Option<Constructor>,
    parent: Option<ParentLink>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> RecordBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            name: short_type_name::<T>().to_owned(),
            properties: IndexMap::new(),
            constructor: None,
            parent: None,
            _marker: PhantomData,
        }
    }

    /// Overrides the type name used in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares the zero-argument construction path.
    pub fn constructor(mut self, construct: fn() -> T) -> Self {
        self.constructor = Some(Arc::new(move || Box::new(construct()) as Instance));
        self
    }

    /// Uses [`Default`] as the construction path.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Declares a readable and writable field.
    pub fn field<F>(self, name: &str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: Typed + Clone + Send + 'static,
    {
        let reader = typed_reader::<T, F>(name, move |t| get(t).clone());
        let writer = typed_writer::<T, F>(name, move |t, v| *get_mut(t) = v);
        self.push(name, F::value_type, Some(reader), Some(writer))
    }

    /// Declares a computed or read-only property.
    pub fn read_only<F>(self, name: &str, get: fn(&T) -> F) -> Self
    where
        F: Typed + Send + 'static,
    {
        let reader = typed_reader::<T, F>(name, get);
        self.push(name, F::value_type, Some(reader), None)
    }

    /// Declares a property that can only be written.
    pub fn write_only<F>(self, name: &str, set: fn(&mut T, F)) -> Self
    where
        F: Typed + Send + 'static,
    {
        let writer = typed_writer::<T, F>(name, set);
        self.push(name, F::value_type, None, Some(writer))
    }

    /// Declares a getter/setter pair.
    pub fn accessor<F>(self, name: &str, get: fn(&T) -> F, set: fn(&mut T, F)) -> Self
    where
        F: Typed + Send + 'static,
    {
        let reader = typed_reader::<T, F>(name, get);
        let writer = typed_writer::<T, F>(name, set);
        self.push(name, F::value_type, Some(reader), Some(writer))
    }

    /// Declares a getter/setter pair whose setter returns `&mut Self` for
    /// chaining. The returned reference is ignored.
    pub fn fluent_accessor<F>(self, name: &str, get: fn(&T) -> F, set: fn(&mut T, F) -> &mut T) -> Self
    where
        F: Typed + Send + 'static,
    {
        let writer = typed_writer::<T, F>(name, move |t, v| {
            set(t, v);
        });
        let reader = typed_reader::<T, F>(name, get);
        self.push(name, F::value_type, Some(reader), Some(writer))
    }

    /// Inherits every property of parent record `P`, reached through the
    /// given projections, and makes `T` a subtype of `P`.
    ///
    /// Call this first; later declarations with the same name override the
    /// inherited ones in place.
    pub fn extends<P: Record>(mut self, get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> Self {
        let parent = record_type::<P>();
        for inherited in parent.properties() {
            let reader = inherited.reader.clone().map(|read| -> Reader {
                let property = inherited.name.clone();
                Arc::new(move |instance: &dyn Any| {
                    let this = downcast::<T>(instance, &property)?;
                    read(get(this) as &dyn Any)
                })
            });
            let writer = inherited.writer.clone().map(|Writer { decode, assign }| {
                let property = inherited.name.clone();
                Writer {
                    decode,
                    assign: Arc::new(move |instance: &mut dyn Any, staged: Staged| {
                        let this = downcast_mut::<T>(instance, &property)?;
                        assign(get_mut(this) as &mut dyn Any, staged)
                    }),
                }
            });
            self.properties.insert(
                inherited.name.clone(),
                PropertyDescriptor {
                    name: inherited.name.clone(),
                    value_type: inherited.value_type,
                    reader,
                    writer,
                },
            );
        }
        self.parent = Some(ParentLink {
            ty: parent,
            upcast: Arc::new(move |instance: &dyn Any| {
                instance
                    .downcast_ref::<T>()
                    .map(|this| Box::new(get(this).clone()) as Instance)
            }),
        });
        self
    }

    fn push(
        mut self,
        name: &str,
        value_type: fn() -> ValueType,
        reader: Option<Reader>,
        writer: Option<Writer>,
    ) -> Self {
        self.properties.insert(
            name.to_owned(),
            PropertyDescriptor {
                name: name.to_owned(),
                value_type,
                reader,
                writer,
            },
        );
        self
    }

    pub(crate) fn build(self) -> RecordType {
        RecordType(Arc::new(RecordMeta {
            name: self.name,
            type_id: TypeId::of::<T>(),
            properties: self.properties,
            constructor: self.constructor,
            parent: self.parent,
        }))
    }
}

fn typed_reader<T, F>(name: &str, get: impl Fn(&T) -> F + Send + Sync + 'static) -> Reader
where
    T: Record,
    F: Typed,
{
    let property = name.to_owned();
    Arc::new(move |instance: &dyn Any| {
        let this = downcast::<T>(instance, &property)?;
        Ok(get(this).into_value())
    })
}

fn typed_writer<T, F>(name: &str, set: impl Fn(&mut T, F) + Send + Sync + 'static) -> Writer
where
    T: Record,
    F: Typed + Send + 'static,
{
    let property = name.to_owned();
    let decode: Decode = Arc::new(move |value: Value| {
        F::from_value(value)
            .map(|typed| Box::new(typed) as Staged)
            .map_err(|e| MapperError::property_access(short_type_name::<T>(), property.as_str(), e.to_string()))
    });
    let property = name.to_owned();
    let assign: Assign = Arc::new(move |instance: &mut dyn Any, staged: Staged| {
        let typed = staged.downcast::<F>().map_err(|_| {
            MapperError::property_access(short_type_name::<T>(), property.as_str(), "staged value has a different type")
        })?;
        let this = downcast_mut::<T>(instance, &property)?;
        set(this, *typed);
        Ok(())
    });
    Writer { decode, assign }
}

fn downcast<'a, T: Record>(instance: &'a dyn Any, property: &str) -> MapperResult<&'a T> {
    instance.downcast_ref::<T>().ok_or_else(|| {
        MapperError::property_access(short_type_name::<T>(), property, "instance has a different type")
    })
}

fn downcast_mut<'a, T: Record>(instance: &'a mut dyn Any, property: &str) -> MapperResult<&'a mut T> {
    instance.downcast_mut::<T>().ok_or_else(|| {
        MapperError::property_access(short_type_name::<T>(), property, "instance has a different type")
    })
}
