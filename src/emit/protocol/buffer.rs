//! In-memory buffer protocol emitter, generalizing the file-stream exemplar
//! (spec §4.5) to a flat `unsigned char *` target with a running cursor.

use crate::emit::protocol::Protocol;
use crate::schema::ParsedStruct;

pub struct BufferProtocol;

impl Protocol for BufferProtocol {
    fn transport_state_record(&self) -> String {
        "typedef struct {\n\
  unsigned char *buffer;\n\
  haris_uint32_t capacity;\n\
  haris_uint32_t curr;\n\
} HarisBufferStream;\n\n"
            .to_string()
    }

    fn private_functions(&self) -> Vec<String> {
        vec![
            "static HarisStatus read_from_buffer_stream(void *_stream,\n\
                                           haris_uint32_t count,\n\
                                           const unsigned char **dest)\n\
{\n\
  HarisBufferStream *stream = (HarisBufferStream*)_stream;\n\
  HARIS_ASSERT(count + stream->curr <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  HARIS_ASSERT(stream->curr + count <= stream->capacity, SIZE);\n\
  *dest = stream->buffer + stream->curr;\n\
  stream->curr += count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus write_to_buffer_stream(void *_stream,\n\
                                          const unsigned char *src,\n\
                                          haris_uint32_t count)\n\
{\n\
  HarisBufferStream *stream = (HarisBufferStream*)_stream;\n\
  HARIS_ASSERT(stream->curr + count <= stream->capacity, SIZE);\n\
  memcpy(stream->buffer + stream->curr, src, count);\n\
  stream->curr += count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_to_buffer(void *ptr,\n\
                                     const HarisStructureInfo *info,\n\
                                     unsigned char *buffer,\n\
                                     haris_uint32_t capacity,\n\
                                     haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisBufferStream buffer_stream;\n\
  haris_uint32_t encoded_size = haris_lib_size(ptr, info, 0, &result);\n\
  if (encoded_size == 0) return result;\n\
  HARIS_ASSERT(encoded_size <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  HARIS_ASSERT(encoded_size <= capacity, SIZE);\n\
  buffer_stream.buffer = buffer;\n\
  buffer_stream.capacity = capacity;\n\
  buffer_stream.curr = 0;\n\
  if ((result = _haris_to_stream(ptr, info, &buffer_stream,\n\
                                 write_to_buffer_stream)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = buffer_stream.curr;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_from_buffer(void *ptr,\n\
                                       const HarisStructureInfo *info,\n\
                                       const unsigned char *buffer,\n\
                                       haris_uint32_t capacity,\n\
                                       haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisBufferStream buffer_stream;\n\
  buffer_stream.buffer = (unsigned char*)buffer;\n\
  buffer_stream.capacity = capacity;\n\
  buffer_stream.curr = 0;\n\
  if ((result = _haris_from_stream(ptr, info, &buffer_stream,\n\
                                   read_from_buffer_stream, 0)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = buffer_stream.curr;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
        ]
    }

    fn public_functions(&self, prefix: &str, strct: &ParsedStruct) -> Vec<String> {
        let name = &strct.name;
        let idx = strct.schema_index;
        vec![
            format!(
                "HarisStatus {prefix}{name}_to_buffer({prefix}{name} *strct,\n\
                            unsigned char *buffer, haris_uint32_t capacity,\n\
                            haris_uint32_t *out_sz)\n\
{{\n\
  return _public_to_buffer(strct, &haris_lib_structures[{idx}],\n\
                           buffer, capacity, out_sz);\n}}\n\n"
            ),
            format!(
                "HarisStatus {prefix}{name}_from_buffer({prefix}{name} *strct,\n\
                              const unsigned char *buffer, haris_uint32_t capacity,\n\
                              haris_uint32_t *out_sz)\n\
{{\n\
  return _public_from_buffer(strct, &haris_lib_structures[{idx}],\n\
                             buffer, capacity, out_sz);\n}}\n\n"
            ),
        ]
    }
}
