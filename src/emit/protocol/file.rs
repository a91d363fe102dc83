//! File-stream protocol emitter (spec §4.5's exemplar; grounded directly on
//! the original `cgenc_file.c`).

use crate::emit::protocol::Protocol;
use crate::schema::ParsedStruct;

pub struct FileProtocol;

impl Protocol for FileProtocol {
    fn transport_state_record(&self) -> String {
        "typedef struct {\n\
  FILE *file;\n\
  haris_uint32_t curr;\n\
  unsigned char buffer[256];\n\
} HarisFileStream;\n\n"
            .to_string()
    }

    fn private_functions(&self) -> Vec<String> {
        vec![
            "static HarisStatus read_from_file_stream(void *_stream,\n\
                                         haris_uint32_t count,\n\
                                         const unsigned char **dest)\n\
{\n\
  HarisFileStream *stream = (HarisFileStream*)_stream;\n\
  HARIS_ASSERT(count + stream->curr <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  HARIS_ASSERT(count <= 256, SIZE);\n\
  HARIS_ASSERT(fread(stream->buffer, 1, count, stream->file) == count,\n\
               INPUT);\n\
  *dest = stream->buffer;\n\
  stream->curr = count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus write_to_file_stream(void *_stream,\n\
                                        const unsigned char *src,\n\
                                        haris_uint32_t count)\n\
{\n\
  HarisFileStream *stream = (HarisFileStream*)_stream;\n\
  HARIS_ASSERT(fwrite(src, 1, count, stream->file) == count, INPUT);\n\
  stream->curr += count;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_to_file(void *ptr,\n\
                                   const HarisStructureInfo *info,\n\
                                   FILE *f,\n\
                                   haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisFileStream file_stream;\n\
  haris_uint32_t encoded_size = haris_lib_size(ptr, info, 0, &result);\n\
  if (encoded_size == 0) return result;\n\
  HARIS_ASSERT(encoded_size <= HARIS_MESSAGE_SIZE_LIMIT, SIZE);\n\
  file_stream.file = f;\n\
  file_stream.curr = 0;\n\
  if ((result = _haris_to_stream(ptr, info, &file_stream,\n\
                                 write_to_file_stream)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = file_stream.curr;\n\
  return HARIS_SUCCESS;\n\
}\n\n"
                .to_string(),
            "static HarisStatus _public_from_file(void *ptr,\n\
                                     const HarisStructureInfo *info,\n\
                                     FILE *f,\n\
                                     haris_uint32_t *out_sz)\n\
{\n\
  HarisStatus result;\n\
  HarisFileStream file_stream;\n\
  file_stream.file = f;\n\
  file_stream.curr = 0;\n\
  if ((result = _haris_from_stream(ptr, info, &file_stream,\n\
                                   read_from_file_stream, 0)) != HARIS_SUCCESS)\n\
    return result;\n\
  if (out_sz) *out_sz = file_stream.curr;\n\
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
                "HarisStatus {prefix}{name}_to_file({prefix}{name} *strct, FILE *f,\n\
                          haris_uint32_t *out_sz)\n\
{{\n\
  return _public_to_file(strct, &haris_lib_structures[{idx}],\n\
                         f, out_sz);\n}}\n\n"
            ),
            format!(
                "HarisStatus {prefix}{name}_from_file({prefix}{name} *strct, FILE *f,\n\
                            haris_uint32_t *out_sz)\n\
{{\n\
  return _public_from_file(strct, &haris_lib_structures[{idx}],\n\
                           f, out_sz);\n}}\n\n"
            ),
        ]
    }
}
